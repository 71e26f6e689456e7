//! Health classification.
//!
//! [`Health`] drives the dashboard state from rolling uptime. [`StatusClass`]
//! only styles the latest-status badge and never feeds into [`Health`].

/// Lower bound (inclusive) of the Normal band, in percent.
pub const NORMAL_MIN_UPTIME: f64 = 90.0;
/// Lower bound (inclusive) of the Unstable band, in percent.
pub const UNSTABLE_MIN_UPTIME: f64 = 50.0;

/// Health state of a monitored model, worst last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Health {
    Normal,
    Unstable,
    Down,
}

impl Health {
    /// Classify a 24h uptime percentage.
    ///
    /// Total over `f64`: anything that is not at least 50 (NaN included) is Down.
    pub fn from_uptime(uptime: f64) -> Self {
        if uptime >= NORMAL_MIN_UPTIME {
            Health::Normal
        } else if uptime >= UNSTABLE_MIN_UPTIME {
            Health::Unstable
        } else {
            Health::Down
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Health::Normal => "Normal",
            Health::Unstable => "Unstable",
            Health::Down => "Down",
        }
    }
}

/// Class of a single probe status label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    RateLimited,
    /// `HTTP <code>` labels; carries the full label.
    HttpError(String),
    Failed,
    /// Anything else, shown verbatim.
    Unknown(String),
}

impl StatusClass {
    pub fn from_label(label: &str) -> Self {
        match label {
            "OK" => StatusClass::Ok,
            "429" => StatusClass::RateLimited,
            "FAIL" => StatusClass::Failed,
            l if l.starts_with("HTTP") => StatusClass::HttpError(l.to_string()),
            l => StatusClass::Unknown(l.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StatusClass::Ok => "OK",
            StatusClass::RateLimited => "Rate limited",
            StatusClass::HttpError(l) | StatusClass::Unknown(l) => l,
            StatusClass::Failed => "Failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(Health::from_uptime(100.0), Health::Normal);
        assert_eq!(Health::from_uptime(90.0), Health::Normal);
        assert_eq!(Health::from_uptime(89.999), Health::Unstable);
        assert_eq!(Health::from_uptime(50.0), Health::Unstable);
        assert_eq!(Health::from_uptime(49.999), Health::Down);
        assert_eq!(Health::from_uptime(0.0), Health::Down);
    }

    #[test]
    fn test_non_finite_input() {
        assert_eq!(Health::from_uptime(f64::NAN), Health::Down);
        assert_eq!(Health::from_uptime(f64::INFINITY), Health::Normal);
        assert_eq!(Health::from_uptime(f64::NEG_INFINITY), Health::Down);
    }

    #[test]
    fn test_labels_and_order() {
        assert_eq!(Health::Normal.label(), "Normal");
        assert_eq!(Health::Unstable.label(), "Unstable");
        assert_eq!(Health::Down.label(), "Down");
        assert!(Health::Normal < Health::Down);
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(StatusClass::from_label("OK"), StatusClass::Ok);
        assert_eq!(StatusClass::from_label("429"), StatusClass::RateLimited);
        assert_eq!(StatusClass::from_label("FAIL"), StatusClass::Failed);
        assert_eq!(
            StatusClass::from_label("HTTP 503"),
            StatusClass::HttpError("HTTP 503".to_string())
        );
        assert_eq!(StatusClass::from_label("HTTP 503").label(), "HTTP 503");
        assert_eq!(StatusClass::from_label("MISS").label(), "MISS");
        assert_eq!(StatusClass::from_label("").label(), "");
    }
}
