use serde::Serialize;

/// Outcome of reconciling one field across a group.
///
/// Variants are declared from best to worst so `Ord` ranks severity; the
/// highlight field reports the worst flag over its spans.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    #[default]
    NoFlag,
    Empty,
    Ok,
    Unanimous,
    Majority,
    Fuzzy,
    Placeholders,
    AllBlank,
    OnlyOne,
    NoMatch,
}

impl Flag {
    pub const ALL: [Flag; 10] = [
        Flag::NoFlag,
        Flag::Empty,
        Flag::Ok,
        Flag::Unanimous,
        Flag::Majority,
        Flag::Fuzzy,
        Flag::Placeholders,
        Flag::AllBlank,
        Flag::OnlyOne,
        Flag::NoMatch,
    ];

    /// Flags a curator should look at.
    pub fn is_problem(self) -> bool {
        matches!(self, Self::Placeholders | Self::AllBlank | Self::OnlyOne | Self::NoMatch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoFlag => "no_flag",
            Self::Empty => "empty",
            Self::Ok => "ok",
            Self::Unanimous => "unanimous",
            Self::Majority => "majority",
            Self::Fuzzy => "fuzzy",
            Self::Placeholders => "placeholders",
            Self::AllBlank => "all_blank",
            Self::OnlyOne => "only_one",
            Self::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
