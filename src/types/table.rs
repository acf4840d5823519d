/// Key role of a column within its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    None,
    Primary,
    Indexed,
}

impl KeyRole {
    /// Short marker used in schema listings.
    pub fn marker(&self) -> &'static str {
        match self {
            KeyRole::None => "",
            KeyRole::Primary => "PRI",
            KeyRole::Indexed => "IDX",
        }
    }
}

/// Metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub key: KeyRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_role_markers() {
        assert_eq!(KeyRole::Primary.marker(), "PRI");
        assert_eq!(KeyRole::Indexed.marker(), "IDX");
        assert_eq!(KeyRole::None.marker(), "");
    }
}
