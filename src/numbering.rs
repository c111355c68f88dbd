use serde::{Deserialize, Serialize};

/// per-year sequence for human-readable agreement numbers, e.g. AGR-2024-00037.
/// resumes from the highest number already issued for the current year and
/// rolls over to 1 at the year boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementNumberSequence {
    prefix: String,
    year: i32,
    last_number: u32,
}

impl AgreementNumberSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            year: 0,
            last_number: 0,
        }
    }

    /// issue the next number for the given year
    pub fn next(&mut self, year: i32) -> String {
        if year != self.year {
            self.year = year;
            self.last_number = 0;
        }
        self.last_number += 1;
        format!("{}-{}-{:05}", self.prefix, self.year, self.last_number)
    }

    /// advance past an already-issued number so reloaded state never collides.
    /// numbers with an unexpected shape are ignored.
    pub fn observe(&mut self, agreement_number: &str) {
        let mut parts = agreement_number.split('-');
        let (Some(prefix), Some(year), Some(number), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return;
        };
        if prefix != self.prefix {
            return;
        }
        let (Ok(year), Ok(number)) = (year.parse::<i32>(), number.parse::<u32>()) else {
            return;
        };

        if year > self.year {
            self.year = year;
            self.last_number = number;
        } else if year == self.year && number > self.last_number {
            self.last_number = number;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_within_year() {
        let mut seq = AgreementNumberSequence::new("AGR");
        assert_eq!(seq.next(2024), "AGR-2024-00001");
        assert_eq!(seq.next(2024), "AGR-2024-00002");
        assert_eq!(seq.next(2024), "AGR-2024-00003");
    }

    #[test]
    fn test_rolls_over_at_year_boundary() {
        let mut seq = AgreementNumberSequence::new("AGR");
        seq.next(2024);
        seq.next(2024);
        assert_eq!(seq.next(2025), "AGR-2025-00001");
    }

    #[test]
    fn test_resumes_from_observed_numbers() {
        let mut seq = AgreementNumberSequence::new("AGR");
        seq.observe("AGR-2024-00041");
        seq.observe("AGR-2024-00007");
        assert_eq!(seq.next(2024), "AGR-2024-00042");
    }

    #[test]
    fn test_observe_ignores_malformed_numbers() {
        let mut seq = AgreementNumberSequence::new("AGR");
        seq.observe("CONV-2024-00099");
        seq.observe("AGR-notayear-00099");
        seq.observe("AGR-2024-00010-extra");
        assert_eq!(seq.next(2024), "AGR-2024-00001");
    }
}
