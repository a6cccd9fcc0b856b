use super::surface::{FieldTag, InputType};

/// Built-in normalization applied to fields without a registered cleaner.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CleanerKind {
    Email,
    Tel,
    Number,
    Url,
    Text,
    Trim,
}

impl CleanerKind {
    /// Picks the cleaner by input type first, then by tag.
    pub fn for_field(tag: FieldTag, input_type: InputType) -> Self {
        match tag {
            FieldTag::Textarea => Self::Text,
            FieldTag::Select => Self::Trim,
            FieldTag::Input => match input_type {
                InputType::Email => Self::Email,
                InputType::Tel => Self::Tel,
                InputType::Number => Self::Number,
                InputType::Url => Self::Url,
                InputType::Text => Self::Text,
                _ => Self::Trim,
            },
        }
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Email => value
                .to_lowercase()
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .collect(),
            Self::Tel => value
                .chars()
                .filter(|ch| {
                    ch.is_ascii_digit() || ch.is_whitespace() || matches!(ch, '-' | '(' | ')' | '+')
                })
                .collect::<String>()
                .trim()
                .to_owned(),
            Self::Number => value
                .chars()
                .filter(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-'))
                .collect(),
            Self::Url => value.to_lowercase().trim().to_owned(),
            Self::Text => value.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::Trim => value.trim().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CleanerKind; 6] = [
        CleanerKind::Email,
        CleanerKind::Tel,
        CleanerKind::Number,
        CleanerKind::Url,
        CleanerKind::Text,
        CleanerKind::Trim,
    ];

    #[test]
    fn selection_prefers_type_then_tag() {
        assert_eq!(
            CleanerKind::for_field(FieldTag::Input, InputType::Email),
            CleanerKind::Email
        );
        assert_eq!(
            CleanerKind::for_field(FieldTag::Textarea, InputType::Text),
            CleanerKind::Text
        );
        assert_eq!(
            CleanerKind::for_field(FieldTag::Input, InputType::Password),
            CleanerKind::Trim
        );
        assert_eq!(
            CleanerKind::for_field(FieldTag::Select, InputType::Text),
            CleanerKind::Trim
        );
    }

    #[test]
    fn category_transforms() {
        assert_eq!(
            CleanerKind::Email.apply(" Ana.Silva @Example.COM "),
            "ana.silva@example.com"
        );
        assert_eq!(
            CleanerKind::Tel.apply(" +55 (11) 9876-5432 ramal "),
            "+55 (11) 9876-5432"
        );
        assert_eq!(CleanerKind::Number.apply(" R$ -1.234,5 "), "-1.2345");
        assert_eq!(
            CleanerKind::Url.apply("  HTTPS://Example.com/A "),
            "https://example.com/a"
        );
        assert_eq!(
            CleanerKind::Text.apply("  muitos \t espaços\n aqui "),
            "muitos espaços aqui"
        );
        assert_eq!(CleanerKind::Trim.apply("  a  b  "), "a  b");
    }

    #[test]
    fn every_category_is_idempotent() {
        let samples = [
            "",
            "   ",
            "  Mixed CASE  text\twith \n breaks ",
            " +1 (555) 010-9999 x12 ",
            "-12.50abc",
            " HTTP://Host.Example/Path?Q=1 ",
            "ÉCOLE  İstanbul ß",
        ];
        for kind in ALL {
            for sample in samples {
                let once = kind.apply(sample);
                assert_eq!(kind.apply(&once), once, "{kind:?} on {sample:?}");
            }
        }
    }
}
