//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use dom_translate::core::format_output_path;

    #[test]
    fn as_is() {
        let final_destination =
            format_output_path("/home/username/Downloads/page.html", Some(""), "en");

        assert_eq!(final_destination, "/home/username/Downloads/page.html");
    }

    #[test]
    fn substitute_language() {
        let final_destination =
            format_output_path("/home/username/Downloads/page.%lang%.html", None, "fr");

        assert_eq!(final_destination, "/home/username/Downloads/page.fr.html");
    }

    #[test]
    fn substitute_title_and_language() {
        let final_destination =
            format_output_path("%title% (%lang%).html", Some("Mercado"), "de");

        assert_eq!(final_destination, "Mercado (de).html");
    }

    #[test]
    fn sanitize() {
        let final_destination = format_output_path(
            r#"/home/username/Downloads/<>:"|?/%title%.html"#,
            Some(r#"/\<>:"|?"#),
            "en",
        );

        assert_eq!(
            final_destination,
            r#"/home/username/Downloads/<>:"|?/__[] - -.html"#
        );
    }

    #[test]
    fn level_up() {
        let final_destination = format_output_path("../%title%.html", Some(".Title"), "en");

        assert_eq!(final_destination, r#"../Title.html"#);
    }

    #[test]
    fn timestamp_has_no_colons() {
        let final_destination = format_output_path("%timestamp%.html", None, "en");

        assert!(!final_destination.contains(':'));
        assert!(final_destination.ends_with("Z.html"));
    }
}
