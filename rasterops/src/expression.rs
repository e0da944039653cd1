/// An already parsed operation call: `output = name(p1, p2, ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationExpression {
    name: String,
    parameters: Vec<String>,
    output: Option<String>,
}

impl OperationExpression {
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            output: None,
        }
    }

    /// Names the result.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Positional parameter `index`, trimmed.
    pub fn parameter(&self, index: usize) -> Option<&str> {
        self.parameters.get(index).map(|p| p.trim())
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// The output name, or `<input>_<operation>` when none was given.
    pub(crate) fn output_or(&self, input: &str) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| format!("{input}_{}", self.name))
    }
}

impl std::fmt::Display for OperationExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(output) = &self.output {
            write!(f, "{output} = ")?;
        }
        write!(f, "{}({})", self.name, self.parameters.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::OperationExpression;

    #[test]
    fn test_expression() {
        let expr = OperationExpression::new("resample", ["dem", " grid ", "bilinear"]);
        assert_eq!(expr.parameter_count(), 3);
        assert_eq!(expr.parameter(1), Some("grid"));
        assert_eq!(expr.parameter(3), None);
        assert_eq!(expr.output_or("dem"), "dem_resample");
        assert_eq!(expr.to_string(), "resample(dem, grid ,bilinear)");
        let expr = expr.with_output("out");
        assert_eq!(expr.output_or("dem"), "out");
        assert_eq!(expr.to_string(), "out = resample(dem, grid ,bilinear)");
    }
}
