//! 离线翻译词典
//!
//! 源语言为西班牙语的小型词典。查找顺序：
//!
//! 1. 精确匹配
//! 2. 去除首尾空白后忽略大小写匹配
//! 3. 部分包含（任一方向），两边都必须超过 3 个字符
//! 4. 含空格的短语逐词翻译，只要有一个词被翻译就重新拼接
//! 5. 原样返回
//!
//! 词条保持插入顺序，部分匹配返回第一个命中的词条。

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};

const KEYS: [&str; 34] = [
    "Catálogo",
    "Favoritos",
    "Mensajes",
    "Vender",
    "Ver Perfil",
    "LogOut",
    "Contactar",
    "Ver detalles",
    "Términos de uso",
    "Política de privacidad",
    "Ayuda",
    "Contacto",
    "Todos los derechos reservados",
    "Iniciar sesión",
    "Registrarse",
    "Cerrar sesión",
    "Buscar",
    "Filtrar",
    "Ordenar por",
    "Precio",
    "Fecha",
    "Guardar",
    "Cancelar",
    "Aceptar",
    "Rechazar",
    "Enviar",
    "Recibir",
    "Comprar",
    "Siguiente",
    "Anterior",
    "Bienvenido",
    "Eliminar",
    "Editar",
    "Compartir",
];

const EN: [&str; 34] = [
    "Catalog",
    "Favorites",
    "Messages",
    "Sell",
    "View Profile",
    "Log Out",
    "Contact",
    "See details",
    "Terms of use",
    "Privacy policy",
    "Help",
    "Contact",
    "All rights reserved",
    "Log in",
    "Sign up",
    "Log out",
    "Search",
    "Filter",
    "Sort by",
    "Price",
    "Date",
    "Save",
    "Cancel",
    "Accept",
    "Reject",
    "Send",
    "Receive",
    "Buy",
    "Next",
    "Previous",
    "Welcome",
    "Delete",
    "Edit",
    "Share",
];

const FR: [&str; 34] = [
    "Catalogue",
    "Favoris",
    "Messages",
    "Vendre",
    "Voir Profil",
    "Déconnexion",
    "Contacter",
    "Voir détails",
    "Conditions d'utilisation",
    "Politique de confidentialité",
    "Aide",
    "Contact",
    "Tous droits réservés",
    "Se connecter",
    "S'inscrire",
    "Déconnexion",
    "Rechercher",
    "Filtrer",
    "Trier par",
    "Prix",
    "Date",
    "Enregistrer",
    "Annuler",
    "Accepter",
    "Refuser",
    "Envoyer",
    "Recevoir",
    "Acheter",
    "Suivant",
    "Précédent",
    "Bienvenue",
    "Supprimer",
    "Modifier",
    "Partager",
];

const DE: [&str; 34] = [
    "Katalog",
    "Favoriten",
    "Nachrichten",
    "Verkaufen",
    "Profil anzeigen",
    "Abmelden",
    "Kontakt",
    "Details anzeigen",
    "Nutzungsbedingungen",
    "Datenschutzrichtlinie",
    "Hilfe",
    "Kontakt",
    "Alle Rechte vorbehalten",
    "Anmelden",
    "Registrieren",
    "Abmelden",
    "Suchen",
    "Filtern",
    "Sortieren nach",
    "Preis",
    "Datum",
    "Speichern",
    "Abbrechen",
    "Akzeptieren",
    "Ablehnen",
    "Senden",
    "Empfangen",
    "Kaufen",
    "Weiter",
    "Zurück",
    "Willkommen",
    "Löschen",
    "Bearbeiten",
    "Teilen",
];

const IT: [&str; 34] = [
    "Catalogo",
    "Preferiti",
    "Messaggi",
    "Vendere",
    "Visualizza Profilo",
    "Disconnettersi",
    "Contattare",
    "Vedi dettagli",
    "Termini di utilizzo",
    "Politica sulla privacy",
    "Aiuto",
    "Contatto",
    "Tutti i diritti riservati",
    "Accedi",
    "Registrati",
    "Disconnettersi",
    "Cerca",
    "Filtra",
    "Ordina per",
    "Prezzo",
    "Data",
    "Salva",
    "Annulla",
    "Accetta",
    "Rifiuta",
    "Invia",
    "Ricevi",
    "Compra",
    "Successivo",
    "Precedente",
    "Benvenuto",
    "Elimina",
    "Modifica",
    "Condividi",
];

const PT: [&str; 34] = [
    "Catálogo",
    "Favoritos",
    "Mensagens",
    "Vender",
    "Ver Perfil",
    "Sair",
    "Contatar",
    "Ver detalhes",
    "Termos de uso",
    "Política de privacidade",
    "Ajuda",
    "Contato",
    "Todos os direitos reservados",
    "Iniciar sessão",
    "Registrar-se",
    "Encerrar sessão",
    "Buscar",
    "Filtrar",
    "Ordenar por",
    "Preço",
    "Data",
    "Salvar",
    "Cancelar",
    "Aceitar",
    "Rejeitar",
    "Enviar",
    "Receber",
    "Comprar",
    "Próximo",
    "Anterior",
    "Bem-vindo",
    "Excluir",
    "Editar",
    "Compartilhar",
];

/// 离线翻译词典
#[derive(Debug, Clone)]
pub struct OfflineDictionary {
    source_lang: String,
    tables: HashMap<String, Vec<(String, String)>>,
}

impl Default for OfflineDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OfflineDictionary {
    /// 内置词典（西班牙语 → en/fr/de/it/pt）
    pub fn builtin() -> Self {
        let mut dictionary = Self::empty(constants::DEFAULT_LANGUAGE);
        for (lang, values) in [("en", &EN), ("fr", &FR), ("de", &DE), ("it", &IT), ("pt", &PT)] {
            dictionary.merge(lang, KEYS.iter().copied().zip(values.iter().copied()));
        }
        dictionary
    }

    /// 空词典
    pub fn empty(source_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            tables: HashMap::new(),
        }
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// 合并词条；已有词条就地覆盖，新词条追加到末尾
    pub fn merge<K, V, I>(&mut self, lang: &str, entries: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let table = self.tables.entry(lang.to_string()).or_default();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match table.iter_mut().find(|(k, _)| *k == key) {
                Some(existing) => existing.1 = value,
                None => table.push((key, value)),
            }
        }
    }

    /// 从 TOML 文件加载扩展词条，返回加载的词条数
    ///
    /// ```toml
    /// [en]
    /// "Ofertas" = "Deals"
    /// ```
    pub fn load_extension<P: AsRef<Path>>(&mut self, path: P) -> TranslationResult<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslationError::ConfigError(format!("读取词典文件失败 {}: {}", path.display(), e))
        })?;
        let count = self.extend_from_toml(&content)?;
        tracing::info!("从 {} 加载了 {} 个词条", path.display(), count);
        Ok(count)
    }

    /// 从 TOML 文本加载扩展词条
    pub fn extend_from_toml(&mut self, content: &str) -> TranslationResult<usize> {
        let parsed: BTreeMap<String, BTreeMap<String, String>> = toml::from_str(content)?;
        let mut count = 0;
        for (lang, entries) in parsed {
            count += entries.len();
            self.merge(&lang, entries);
        }
        Ok(count)
    }

    /// 有词典的目标语言
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.tables.keys().cloned().collect();
        langs.sort();
        langs
    }

    /// 词典中某个语言的词条数
    pub fn len(&self, lang: &str) -> usize {
        self.tables.get(lang).map(Vec::len).unwrap_or(0)
    }

    /// 翻译文本，找不到时原样返回
    pub fn translate(&self, text: &str, target_lang: &str) -> String {
        self.lookup(text, target_lang)
            .unwrap_or_else(|| text.to_string())
    }

    /// 查找译文，结果与原文相同或找不到时返回 `None`
    pub fn lookup(&self, text: &str, target_lang: &str) -> Option<String> {
        let translated = self.lookup_inner(text, target_lang)?;
        (translated != text).then_some(translated)
    }

    fn lookup_inner(&self, text: &str, target_lang: &str) -> Option<String> {
        if text.is_empty() || target_lang == self.source_lang {
            return None;
        }

        let table = self.tables.get(target_lang)?;

        // 1. 精确匹配
        if let Some((_, value)) = table.iter().find(|(k, _)| k == text) {
            return Some(value.clone());
        }

        // 2. 忽略大小写
        let lower_text = text.trim().to_lowercase();
        if let Some((_, value)) = table.iter().find(|(k, _)| k.to_lowercase() == lower_text) {
            return Some(value.clone());
        }

        // 3. 部分包含，避免短词误匹配
        let text_chars = lower_text.chars().count();
        if text_chars > constants::MIN_PARTIAL_MATCH_CHARS {
            for (key, value) in table {
                let lower_key = key.to_lowercase();
                if key.chars().count() > constants::MIN_PARTIAL_MATCH_CHARS
                    && (lower_text.contains(&lower_key) || lower_key.contains(&lower_text))
                {
                    tracing::debug!("部分匹配: \"{}\" ~ \"{}\"", text, key);
                    return Some(value.clone());
                }
            }
        }

        // 4. 逐词翻译
        if text.contains(' ') {
            let mut changed = false;
            let words: Vec<String> = text
                .split(' ')
                .map(|word| match self.lookup(word, target_lang) {
                    Some(translated) => {
                        changed = true;
                        translated
                    }
                    None => word.to_string(),
                })
                .collect();

            if changed {
                return Some(words.join(" "));
            }
        }

        None
    }
}
