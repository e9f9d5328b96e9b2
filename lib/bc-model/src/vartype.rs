//! Variable type and constraint sense.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

impl VarType {
    pub fn is_discrete(self) -> bool {
        matches!(self, VarType::Integer | VarType::Binary)
    }
}

/// Sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sense {
    Less,
    Equal,
    Greater,
}

impl Sense {
    /// `slack = rhs - lhs`. `violated` applies the sense- and
    /// epsilon-aware comparison from §4.3.
    pub fn violated(self, slack: f64, eps: f64) -> bool {
        match self {
            Sense::Less => slack < -eps,
            Sense::Greater => slack > eps,
            Sense::Equal => slack.abs() > eps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_violated_when_slack_negative() {
        assert!(Sense::Less.violated(-0.1, 1e-6));
        assert!(!Sense::Less.violated(0.1, 1e-6));
    }

    #[test]
    fn equal_violated_either_direction() {
        assert!(Sense::Equal.violated(0.1, 1e-6));
        assert!(Sense::Equal.violated(-0.1, 1e-6));
        assert!(!Sense::Equal.violated(1e-9, 1e-6));
    }
}
