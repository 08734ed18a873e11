use crate::{error::LimitConfigError, limits::LimitExpr};

/// Settings applied uniformly to every package of one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    /// Package name prefix. Use slash as a separator when nesting.
    pub prefix:   String,
    /// Upper limit for serial byte sizes, as a target language expression.
    pub size_max: LimitExpr,
    /// Upper limit for the number of elements in a list.
    pub list_max: LimitExpr,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            prefix:   String::new(),
            size_max: LimitExpr::default_size_max(),
            list_max: LimitExpr::default_list_max(),
        }
    }
}

impl CompileConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_size_max(mut self, expr: &str) -> Result<Self, LimitConfigError> {
        self.size_max = LimitExpr::parse("size limit", expr)?;
        Ok(self)
    }

    pub fn with_list_max(mut self, expr: &str) -> Result<Self, LimitConfigError> {
        self.list_max = LimitExpr::parse("list limit", expr)?;
        Ok(self)
    }

    /// Joins the prefix and a declared package path with slashes.
    pub fn package_name(&self, declared: &str) -> String {
        self.prefix
            .split('/')
            .chain(declared.split('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}
