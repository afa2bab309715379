use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
}

/// User-facing strings of the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strings {
    pub title: String,
    pub bot_name: String,
    pub greeting: String,
    pub placeholder: String,
    pub send_label: String,
    pub close_label: String,
    pub fallback: String,
}

impl Locale {
    /// Resolves the string table, folding the contact phone into the fallback.
    pub fn strings(self, contact_phone: Option<&str>) -> Strings {
        match self {
            Locale::En => Strings {
                title: "Chat with us".into(),
                bot_name: "Assistant".into(),
                greeting: "Hello! How can I help you today?".into(),
                placeholder: "Type your question...".into(),
                send_label: "Send".into(),
                close_label: "Close".into(),
                fallback: match contact_phone {
                    Some(phone) => format!(
                        "Sorry, something went wrong. Please try again later or call us at {phone}."
                    ),
                    None => "Sorry, something went wrong. Please try again later or call us.".into(),
                },
            },
            Locale::Ru => Strings {
                title: "Консультация".into(),
                bot_name: "Бот".into(),
                greeting: "Здравствуйте! Чем могу помочь?".into(),
                placeholder: "Напишите ваш вопрос...".into(),
                send_label: "Отправить".into(),
                close_label: "Закрыть".into(),
                fallback: match contact_phone {
                    Some(phone) => format!(
                        "Извините, произошла ошибка. Пожалуйста, попробуйте позже или позвоните нам: {phone}."
                    ),
                    None => "Извините, произошла ошибка. Пожалуйста, попробуйте позже или позвоните нам.".into(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_lists_phone_when_configured() {
        let strings = Locale::En.strings(Some("+1 555 0100"));
        assert!(strings.fallback.contains("+1 555 0100"));

        let strings = Locale::Ru.strings(None);
        assert!(strings.fallback.ends_with("позвоните нам."));
    }
}
