//! Translation table and language selection.
//!
//! Two languages ship with the application, English and Portuguese. The selected
//! language is persisted under [`LANGUAGE_KEY`] in the same backend as the snippets.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::warn;

use crate::error::{ImportError, StorageError, StoreError};
use crate::models::storage::{KeyValueStore, LANGUAGE_KEY};
use crate::models::store::StoreLabels;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    #[default]
    Pt,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Pt];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "en" => Some(Language::En),
            "pt" => Some(Language::Pt),
            _ => None,
        }
    }

    /// The other language, for a two-state toggle.
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Pt,
            Language::Pt => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

const EN: &[(&str, &str)] = &[
    ("new", "New"),
    ("run", "Run"),
    ("save", "Save"),
    ("duplicate", "Duplicate"),
    ("delete", "Delete"),
    ("export", "Export"),
    ("import", "Import"),
    ("rename", "Rename"),
    ("edit", "Edit"),
    ("search", "Search"),
    ("reorder", "Reorder"),
    ("language", "Language"),
    ("quit", "Quit"),
    ("nameLabel", "Name"),
    ("codeLabel", "Code"),
    ("output", "Output"),
    ("savedSnippets", "Saved snippets"),
    ("searchPlaceholder", "Search…"),
    ("namePlaceholder", "Ex.: Clear cookies"),
    ("codePlaceholder", "// Paste or write your code here"),
    ("importPathPrompt", "Path of the file to import"),
    ("newSnippetName", "New snippet"),
    ("exampleSnippetName", "Example: Hello Console"),
    (
        "exampleSnippetCode",
        "console.log('Hello from Console Rules!');",
    ),
    ("noTitleFallback", "Untitled"),
    ("snippetSaved", "Snippet saved"),
    ("snippetDeleted", "Snippet deleted"),
    ("snippetDuplicated", "Snippet duplicated"),
    ("snippetCreated", "Snippet created"),
    ("snippetNotFound", "Snippet not found"),
    ("executedSuccessfully", "Executed successfully"),
    ("exportedTo", "Exported to {path}"),
    ("clearSearchToReorder", "Clear search to reorder"),
    ("orderUpdated", "Order updated"),
    ("cannotMoveFurther", "Already at the edge of the list"),
    ("noActiveSnippet", "No active snippet"),
    ("running", "Running…"),
    ("alreadyRunning", "Already running"),
    ("errorMessage", "Error: {message}"),
    ("unknownError", "Unknown error"),
    ("nothingToImport", "Nothing to import"),
    ("importFailed", "Import failed"),
    ("importedCount", "Imported {count}"),
    ("notPersisted", "Not saved to storage: {message}"),
    ("languageChanged", "Language: {language}"),
    ("deleteConfirmation", "Delete \"{name}\"?"),
    ("confirmHint", "[y] Yes │ [n] No"),
    ("copySuffix", " (copy)"),
    ("noSnippets", "No snippets"),
];

const PT: &[(&str, &str)] = &[
    ("new", "Novo"),
    ("run", "Executar"),
    ("save", "Salvar"),
    ("duplicate", "Duplicar"),
    ("delete", "Excluir"),
    ("export", "Exportar"),
    ("import", "Importar"),
    ("rename", "Renomear"),
    ("edit", "Editar"),
    ("search", "Buscar"),
    ("reorder", "Reordenar"),
    ("language", "Idioma"),
    ("quit", "Sair"),
    ("nameLabel", "Nome"),
    ("codeLabel", "Código"),
    ("output", "Saída"),
    ("savedSnippets", "Snippets salvos"),
    ("searchPlaceholder", "Buscar…"),
    ("namePlaceholder", "Ex.: Limpar cookies"),
    ("codePlaceholder", "// Cole ou escreva seu código aqui"),
    ("importPathPrompt", "Caminho do arquivo para importar"),
    ("newSnippetName", "Novo snippet"),
    ("exampleSnippetName", "Exemplo: Olá Console"),
    ("exampleSnippetCode", "console.log('Olá do Console Rules!');"),
    ("noTitleFallback", "Sem título"),
    ("snippetSaved", "Snippet salvo"),
    ("snippetDeleted", "Snippet excluído"),
    ("snippetDuplicated", "Snippet duplicado"),
    ("snippetCreated", "Snippet criado"),
    ("snippetNotFound", "Snippet não encontrado"),
    ("executedSuccessfully", "Executado com sucesso"),
    ("exportedTo", "Exportado para {path}"),
    ("clearSearchToReorder", "Limpe a busca para reordenar"),
    ("orderUpdated", "Ordem atualizada"),
    ("cannotMoveFurther", "Já está na borda da lista"),
    ("noActiveSnippet", "Nenhum snippet ativo"),
    ("running", "Executando…"),
    ("alreadyRunning", "Já em execução"),
    ("errorMessage", "Erro: {message}"),
    ("unknownError", "Erro desconhecido"),
    ("nothingToImport", "Nada para importar"),
    ("importFailed", "Falha ao importar"),
    ("importedCount", "Importados {count}"),
    ("notPersisted", "Não salvo no armazenamento: {message}"),
    ("languageChanged", "Idioma: {language}"),
    ("deleteConfirmation", "Excluir \"{name}\"?"),
    ("confirmHint", "[y] Sim │ [n] Não"),
    ("copySuffix", " (cópia)"),
    ("noSnippets", "Nenhum snippet"),
];

static TRANSLATIONS: Lazy<HashMap<Language, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        HashMap::from([
            (Language::En, EN.iter().copied().collect()),
            (Language::Pt, PT.iter().copied().collect()),
        ])
    });

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Looks up user-facing strings in the current language.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Reads the persisted language, falling back to `default` when unset or unknown.
    pub async fn load<S: KeyValueStore>(
        storage: &S,
        default: Language,
    ) -> Result<Self, StorageError> {
        let stored = storage.get(LANGUAGE_KEY).await?;
        let language = match stored {
            Some(Value::String(code)) => Language::from_code(&code).unwrap_or_else(|| {
                warn!("stored language {code} not supported, using {default}");
                default
            }),
            _ => default,
        };
        Ok(Self { language })
    }

    /// Switches to `code` and persists it. Unsupported codes leave the language
    /// unchanged and return `Ok(false)`.
    pub async fn set_language<S: KeyValueStore>(
        &mut self,
        storage: &S,
        code: &str,
    ) -> Result<bool, StorageError> {
        let Some(language) = Language::from_code(code) else {
            warn!("language {code} not supported");
            return Ok(false);
        };
        storage
            .set(LANGUAGE_KEY, Value::String(language.code().to_string()))
            .await?;
        self.language = language;
        Ok(true)
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn supported_languages() -> Vec<&'static str> {
        Language::ALL.iter().map(|l| l.code()).collect()
    }

    pub fn t(&self, key: &str) -> String {
        match TRANSLATIONS
            .get(&self.language)
            .and_then(|table| table.get(key))
        {
            Some(text) => (*text).to_string(),
            None => {
                warn!(
                    "translation key \"{key}\" not found for language \"{}\"",
                    self.language
                );
                key.to_string()
            }
        }
    }

    /// Like [`Translator::t`], replacing `{name}` placeholders from `params`.
    /// Placeholders without a (non-empty) value are left as written.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let template = self.t(key);
        PLACEHOLDER
            .replace_all(&template, |caps: &Captures| {
                params
                    .iter()
                    .find(|(name, value)| *name == &caps[1] && !value.is_empty())
                    .map(|(_, value)| (*value).to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    pub fn error_status(&self, message: &str) -> String {
        let message = if message.trim().is_empty() {
            self.t("unknownError")
        } else {
            message.to_string()
        };
        self.t_with("errorMessage", &[("message", &message)])
    }

    /// Status line for a failed store operation.
    pub fn store_error(&self, err: &StoreError) -> String {
        match err {
            StoreError::NotFound(_) => self.t("snippetNotFound"),
            StoreError::Import(ImportError::NothingToImport) => self.t("nothingToImport"),
            StoreError::Import(e) => format!("{}: {e}", self.t("importFailed")),
            StoreError::Unpersisted(e) => {
                self.t_with("notPersisted", &[("message", &e.to_string())])
            }
            other => self.error_status(&other.to_string()),
        }
    }

    pub fn store_labels(&self) -> StoreLabels {
        StoreLabels {
            seed_name: self.t("exampleSnippetName"),
            seed_code: self.t("exampleSnippetCode"),
            new_name: self.t("newSnippetName"),
            untitled: self.t("noTitleFallback"),
            copy_suffix: self.t("copySuffix"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_tables_have_the_same_keys() {
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        let pt: Vec<_> = PT.iter().map(|(k, _)| *k).collect();
        assert_eq!(en, pt);
    }

    #[test]
    fn test_missing_key_returns_key() {
        let translator = Translator::new(Language::En);
        assert_eq!(translator.t("doesNotExist"), "doesNotExist");
    }

    #[test]
    fn test_placeholder_substitution() {
        let translator = Translator::new(Language::Pt);
        assert_eq!(
            translator.t_with("importedCount", &[("count", "3")]),
            "Importados 3"
        );
        assert_eq!(translator.t_with("importedCount", &[]), "Importados {count}");
    }

    #[test]
    fn test_error_status_falls_back_to_unknown() {
        let translator = Translator::new(Language::En);
        assert_eq!(translator.error_status(""), "Error: Unknown error");
        assert_eq!(translator.error_status("boom"), "Error: boom");
    }

    #[test]
    fn test_store_labels_follow_language() {
        assert_eq!(Translator::new(Language::En).store_labels().copy_suffix, " (copy)");
        assert_eq!(Translator::new(Language::Pt).store_labels().untitled, "Sem título");
    }

    #[test]
    fn test_store_error_statuses() {
        let translator = Translator::new(Language::En);
        assert_eq!(
            translator.store_error(&StoreError::Import(ImportError::NothingToImport)),
            "Nothing to import"
        );
        assert_eq!(
            translator.store_error(&StoreError::Import(ImportError::InvalidFormat(
                "x".to_string()
            ))),
            "Import failed: invalid format: x"
        );
        assert_eq!(
            translator.store_error(&StoreError::NotFound("a".to_string())),
            "Snippet not found"
        );
        assert_eq!(
            translator.store_error(&StoreError::Unpersisted(StorageError::Unavailable(
                "disk full".to_string()
            ))),
            "Not saved to storage: storage unavailable: disk full"
        );
    }

    #[tokio::test]
    async fn test_load_defaults_when_unset_or_unknown() {
        let storage = MemoryStorage::new();
        let translator = Translator::load(&storage, Language::En).await.unwrap();
        assert_eq!(translator.language(), Language::En);

        let storage = MemoryStorage::new().with_value(LANGUAGE_KEY, json!("fr"));
        let translator = Translator::load(&storage, Language::Pt).await.unwrap();
        assert_eq!(translator.language(), Language::Pt);
    }

    #[tokio::test]
    async fn test_set_language_persists_supported_codes_only() {
        let storage = MemoryStorage::new();
        let mut translator = Translator::new(Language::Pt);

        assert!(translator.set_language(&storage, "en").await.unwrap());
        assert_eq!(storage.peek(LANGUAGE_KEY), Some(json!("en")));

        assert!(!translator.set_language(&storage, "de").await.unwrap());
        assert_eq!(translator.language(), Language::En);
    }
}
