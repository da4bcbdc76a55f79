//! Regression variables attached to the working model.

/// Outlier pattern shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlierKind {
    /// Single-point shift.
    Additive,
    /// Permanent step.
    LevelShift,
    /// Decaying shift.
    TransitoryChange,
    /// Recurring shift at a fixed phase.
    Seasonal,
}

impl OutlierKind {
    /// Conventional two-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            OutlierKind::Additive => "AO",
            OutlierKind::LevelShift => "LS",
            OutlierKind::TransitoryChange => "TC",
            OutlierKind::Seasonal => "SO",
        }
    }
}

/// Role of a regression variable.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableRole {
    /// Six-column trading-day contrasts.
    TradingDays,
    /// One-column working-day contrast.
    WorkingDays,
    /// Leap-year correction.
    LeapYear,
    /// Easter effect.
    Easter,
    /// Outlier of the given kind at the given observation index.
    Outlier {
        /// Pattern shape.
        kind: OutlierKind,
        /// Observation index of the outlier.
        position: usize,
    },
    /// Caller-supplied regressor columns.
    User {
        /// Regressor columns, each aligned with the series domain.
        columns: Vec<Vec<f64>>,
    },
}

impl VariableRole {
    /// Number of regressor columns the role contributes.
    pub fn dimension(&self) -> usize {
        match self {
            VariableRole::TradingDays => 6,
            VariableRole::User { columns } => columns.len(),
            _ => 1,
        }
    }
}

/// A regression variable of the working model.
///
/// Variables marked `prespecified` are fixed by the caller: no sub-component
/// may add, remove or significance-test them. Variables carrying fixed
/// coefficients are pre-adjusted out of the series and never enter the
/// estimation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Display name.
    pub name: String,
    /// Role and per-role payload.
    pub role: VariableRole,
    /// Fixed by the caller, never tested or removed.
    pub prespecified: bool,
    /// Fixed coefficients (one per column), removed from estimation.
    pub fixed_coefficients: Option<Vec<f64>>,
}

impl Variable {
    /// Estimated trading-day contrasts.
    pub fn trading_days() -> Self {
        Self {
            name: "td".to_string(),
            role: VariableRole::TradingDays,
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Estimated working-day contrast.
    pub fn working_days() -> Self {
        Self {
            name: "wd".to_string(),
            role: VariableRole::WorkingDays,
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Estimated leap-year correction.
    pub fn leap_year() -> Self {
        Self {
            name: "lp".to_string(),
            role: VariableRole::LeapYear,
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Estimated Easter effect.
    pub fn easter() -> Self {
        Self {
            name: "easter".to_string(),
            role: VariableRole::Easter,
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Outlier at the given position.
    pub fn outlier(kind: OutlierKind, position: usize) -> Self {
        Self {
            name: format!("{}.{}", kind.code(), position),
            role: VariableRole::Outlier { kind, position },
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Caller-supplied regressor.
    pub fn user(name: impl Into<String>, columns: Vec<Vec<f64>>) -> Self {
        Self {
            name: name.into(),
            role: VariableRole::User { columns },
            prespecified: false,
            fixed_coefficients: None,
        }
    }

    /// Mark the variable as prespecified.
    pub fn prespecified(mut self) -> Self {
        self.prespecified = true;
        self
    }

    /// Fix the variable's coefficients; it is then pre-adjusted out of the
    /// estimation problem entirely.
    pub fn with_fixed_coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.fixed_coefficients = Some(coefficients);
        self
    }

    /// Number of regressor columns.
    pub fn dimension(&self) -> usize {
        self.role.dimension()
    }

    /// Whether the variable is an outlier regressor.
    pub fn is_outlier(&self) -> bool {
        matches!(self.role, VariableRole::Outlier { .. })
    }

    /// Whether the variable is a calendar regressor.
    pub fn is_calendar(&self) -> bool {
        matches!(
            self.role,
            VariableRole::TradingDays
                | VariableRole::WorkingDays
                | VariableRole::LeapYear
                | VariableRole::Easter
        )
    }

    /// Whether the variable participates in estimation (no fixed
    /// coefficients).
    pub fn is_estimated(&self) -> bool {
        self.fixed_coefficients.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlier_names_carry_kind_and_position() {
        let var = Variable::outlier(OutlierKind::LevelShift, 60);
        assert_eq!(var.name, "LS.60");
        assert!(var.is_outlier());
        assert!(!var.is_calendar());
        assert_eq!(var.dimension(), 1);
    }

    #[test]
    fn trading_days_have_six_columns() {
        assert_eq!(Variable::trading_days().dimension(), 6);
        assert_eq!(Variable::working_days().dimension(), 1);
    }

    #[test]
    fn prespecified_builder() {
        let var = Variable::outlier(OutlierKind::Additive, 10).prespecified();
        assert!(var.prespecified);
        assert!(var.is_estimated());
    }

    #[test]
    fn fixed_coefficients_exclude_from_estimation() {
        let var = Variable::leap_year().with_fixed_coefficients(vec![0.3]);
        assert!(!var.is_estimated());
    }

    #[test]
    fn user_variable_dimension_follows_columns() {
        let var = Variable::user("intervention", vec![vec![0.0; 10], vec![1.0; 10]]);
        assert_eq!(var.dimension(), 2);
    }
}
