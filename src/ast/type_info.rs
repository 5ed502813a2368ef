use std::{fmt::Display, str::FromStr};

/// The closed set of value types a Betsy expression can produce. There
/// are no implicit conversions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeInfo {
    Int,
    Bool,
}

pub struct TypeInfoParseError(pub String);

impl FromStr for TypeInfo {
    type Err = TypeInfoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "bool" => Ok(Self::Bool),
            _ => Err(TypeInfoParseError(format!("Invalid type '{s}'"))),
        }
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            TypeInfo::Int => "int",
            TypeInfo::Bool => "bool",
        };

        f.write_str(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        assert_eq!("int".parse::<TypeInfo>().ok(), Some(TypeInfo::Int));
        assert_eq!("bool".parse::<TypeInfo>().ok(), Some(TypeInfo::Bool));
        assert_eq!(TypeInfo::Int.to_string(), "int");
        assert_eq!(TypeInfo::Bool.to_string(), "bool");
    }

    #[test]
    fn test_unknown_type_name() {
        assert!("float".parse::<TypeInfo>().is_err());
        assert!("Int".parse::<TypeInfo>().is_err());
    }
}
