pub const SCORE_MIN: i64 = 0;
pub const SCORE_MAX: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Letter grade for an average using the fixed 90/80/70/60 cutoffs.
    pub fn from_average(average: f64) -> Self {
        if average >= 90.0 {
            Grade::A
        } else if average >= 80.0 {
            Grade::B
        } else if average >= 70.0 {
            Grade::C
        } else if average >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half away from zero to 2 decimals.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub total: i64,
    pub average: f64,
    pub grade: Grade,
}

pub fn summarize(kor: i64, eng: i64, mat: i64) -> ScoreSummary {
    let total = kor + eng + mat;
    let average = round_2_decimals(total as f64 / 3.0);
    ScoreSummary {
        total,
        average,
        grade: Grade::from_average(average),
    }
}

pub fn score_in_range(v: i64) -> bool {
    (SCORE_MIN..=SCORE_MAX).contains(&v)
}
