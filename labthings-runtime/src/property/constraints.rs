use serde_json::Value;

/// The constraint subset from spec.md section 4.1: numeric bounds, string
/// length/pattern, and the schema-level `allow_inf_nan` escape hatch. All
/// fields are optional; an unset constraint is simply not checked.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub gt: Option<f64>,
    pub ge: Option<f64>,
    pub lt: Option<f64>,
    pub le: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<regex::Regex>,
    pub allow_inf_nan: bool,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, v: f64) -> Self {
        self.gt = Some(v);
        self
    }

    pub fn ge(mut self, v: f64) -> Self {
        self.ge = Some(v);
        self
    }

    pub fn lt(mut self, v: f64) -> Self {
        self.lt = Some(v);
        self
    }

    pub fn le(mut self, v: f64) -> Self {
        self.le = Some(v);
        self
    }

    pub fn multiple_of(mut self, v: f64) -> Self {
        self.multiple_of = Some(v);
        self
    }

    pub fn min_length(mut self, v: usize) -> Self {
        self.min_length = Some(v);
        self
    }

    pub fn max_length(mut self, v: usize) -> Self {
        self.max_length = Some(v);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = regex::Regex::new(pattern).ok();
        self
    }

    pub fn allow_inf_nan(mut self, v: bool) -> Self {
        self.allow_inf_nan = v;
        self
    }

    /// Checks `value` against every configured constraint, collecting all
    /// violations rather than stopping at the first — the HTTP 422 body
    /// reports every failing constraint in one shot.
    pub fn validate(&self, value: &Value) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(n) = value.as_f64() {
            if !self.allow_inf_nan && !n.is_finite() {
                errors.push("value must be finite".to_string());
            }
            if let Some(gt) = self.gt {
                if !(n > gt) {
                    errors.push(format!("value must be greater than {gt}"));
                }
            }
            if let Some(ge) = self.ge {
                if !(n >= ge) {
                    errors.push(format!("value must be greater than or equal to {ge}"));
                }
            }
            if let Some(lt) = self.lt {
                if !(n < lt) {
                    errors.push(format!("value must be less than {lt}"));
                }
            }
            if let Some(le) = self.le {
                if !(n <= le) {
                    errors.push(format!("value must be less than or equal to {le}"));
                }
            }
            if let Some(m) = self.multiple_of {
                if m != 0.0 && (n / m).fract().abs() > f64::EPSILON {
                    errors.push(format!("value must be a multiple of {m}"));
                }
            }
        }

        if let Some(s) = value.as_str() {
            if let Some(min) = self.min_length {
                if s.len() < min {
                    errors.push(format!("value must be at least {min} characters"));
                }
            }
            if let Some(max) = self.max_length {
                if s.len() > max {
                    errors.push(format!("value must be at most {max} characters"));
                }
            }
            if let Some(pattern) = &self.pattern {
                if !pattern.is_match(s) {
                    errors.push(format!("value must match pattern {}", pattern.as_str()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
