//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use std::fs;

    use assert_cmd::Command;
    use tempfile::TempDir;

    const PAGE: &str = "<html><head><title>Mercado</title></head>\
        <body><h1>Catálogo</h1><p>Favoritos</p><p>xyz123</p></body></html>";

    fn dom_translate(dir: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("dom-translate").unwrap();
        cmd.current_dir(dir.path())
            .env_remove("DOM_TRANSLATE_API_KEY")
            .env_remove("DOM_TRANSLATE_DEFAULT_LANG")
            .env_remove("DOM_TRANSLATE_SOURCE_LANG")
            .env_remove("DOM_TRANSLATE_ENABLED")
            .env_remove("DOM_TRANSLATE_STATE_PATH");
        cmd
    }

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), PAGE).unwrap();
        dir
    }

    #[test]
    fn translate_offline_to_stdout() {
        let dir = setup();
        let output = dom_translate(&dir)
            .args(["page.html", "-l", "en", "--offline", "--state", "state.redb"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let html = String::from_utf8(output.stdout).unwrap();
        assert!(html.contains(">Catalog</h1>"));
        assert!(html.contains("data-original-text=\"Catálogo\""));
        assert!(html.contains(">Favorites</p>"));
        assert!(html.contains(">xyz123</p>"));

        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("en: completed"));
    }

    #[test]
    fn persisted_language_is_reused() {
        let dir = setup();
        dom_translate(&dir)
            .args(["page.html", "-l", "fr", "--offline", "--state", "state.redb"])
            .assert()
            .success();

        let output = dom_translate(&dir)
            .args([
                "page.html",
                "--offline",
                "--state",
                "state.redb",
                "-o",
                "%title%.%lang%.html",
            ])
            .output()
            .unwrap();

        assert!(output.status.success());
        let html = fs::read_to_string(dir.path().join("Mercado.fr.html")).unwrap();
        assert!(html.contains(">Catalogue</h1>"));
        assert!(html.contains(">Favoris</p>"));
    }

    #[test]
    fn translated_output_round_trips_to_default_language() {
        let dir = setup();
        dom_translate(&dir)
            .args(["page.html", "-l", "en", "--offline", "--state", "state.redb", "-o", "page.en.html"])
            .assert()
            .success();

        let output = dom_translate(&dir)
            .args(["page.en.html", "-l", "es", "--offline", "--state", "state.redb"])
            .output()
            .unwrap();

        assert!(output.status.success());
        let html = String::from_utf8(output.stdout).unwrap();
        assert!(html.contains(">Catálogo</h1>"));
        assert!(html.contains(">Favoritos</p>"));
        assert!(!html.contains("data-translate-index"));
    }

    #[test]
    fn print_env_docs() {
        let dir = setup();
        let output = dom_translate(&dir).arg("--env-docs").output().unwrap();

        assert!(output.status.success());
        let docs = String::from_utf8(output.stdout).unwrap();
        assert!(docs.contains("DOM_TRANSLATE_BATCH_SIZE"));
        assert!(docs.contains("DOM_TRANSLATE_API_KEY"));
    }

    #[test]
    fn generate_config() {
        let dir = setup();
        dom_translate(&dir)
            .args(["--generate-config", "dom-translate.toml"])
            .assert()
            .success();

        let config = fs::read_to_string(dir.path().join("dom-translate.toml")).unwrap();
        assert!(config.contains("YOUR_API_KEY_HERE"));
    }
}

#[cfg(test)]
mod failing {
    use std::fs;

    use assert_cmd::Command;
    use tempfile::TempDir;

    #[test]
    fn unsupported_language() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("page.html"), "<p>Precio</p>").unwrap();

        Command::cargo_bin("dom-translate")
            .unwrap()
            .current_dir(dir.path())
            .args(["page.html", "-l", "tlh", "--offline", "--state", "state.redb"])
            .assert()
            .failure();
    }

    #[test]
    fn missing_input() {
        let dir = TempDir::new().unwrap();

        Command::cargo_bin("dom-translate")
            .unwrap()
            .current_dir(dir.path())
            .args(["missing.html", "--offline", "--state", "state.redb"])
            .assert()
            .failure();
    }
}
