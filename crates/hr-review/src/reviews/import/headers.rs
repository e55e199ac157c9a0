/// Canonical spreadsheet columns understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    Name,
    Department,
    Position,
    Period,
    Evaluator1,
    Evaluator2,
    Method,
    Score,
    Grade,
    Rank,
    Feedback1,
    Feedback2,
}

impl ReviewField {
    pub const fn ordered() -> [Self; 12] {
        [
            Self::Name,
            Self::Department,
            Self::Position,
            Self::Period,
            Self::Evaluator1,
            Self::Evaluator2,
            Self::Method,
            Self::Score,
            Self::Grade,
            Self::Rank,
            Self::Feedback1,
            Self::Feedback2,
        ]
    }

    /// Accepted header spellings, Korean and English.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["이름", "성명", "name", "피평가자", "직원명"],
            Self::Department => &["부서", "department", "dept"],
            Self::Position => &["직급", "직위", "position"],
            Self::Period => &["분기", "period", "평가기간", "평가분기", "기간"],
            Self::Evaluator1 => &["1차평가자", "평가자1", "evaluator1", "1차 평가자"],
            Self::Evaluator2 => &["2차평가자", "평가자2", "evaluator2", "2차 평가자"],
            Self::Method => &["평가방식", "방식", "method", "평가 방법"],
            Self::Score => &["점수", "score", "평가점수"],
            Self::Grade => &["등급", "grade", "평가등급"],
            Self::Rank => &["순위", "rank"],
            Self::Feedback1 => &["1차피드백", "피드백1", "feedback1", "1차 피드백", "feedback"],
            Self::Feedback2 => &["2차피드백", "피드백2", "feedback2", "2차 피드백"],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Lowercases and strips whitespace plus invisible marks spreadsheets leave behind.
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '\u{feff}' | '\u{200b}'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn exact_match(normalized: &str, field: ReviewField) -> bool {
    !normalized.is_empty()
        && field
            .aliases()
            .iter()
            .any(|alias| normalize_header(alias) == normalized)
}

fn partial_match(normalized: &str, field: ReviewField) -> bool {
    !normalized.is_empty()
        && field
            .aliases()
            .iter()
            .any(|alias| normalized.contains(&normalize_header(alias)))
}

/// Column position for each canonical field, resolved from a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: [Option<usize>; 12],
}

impl ColumnMap {
    /// Exact alias matches claim columns first, then substring matches fill the
    /// remaining fields. A column is never assigned to two fields.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let normalized: Vec<String> = headers
            .iter()
            .map(|header| normalize_header(header.as_ref()))
            .collect();
        let mut map = Self::default();
        let mut claimed = vec![false; normalized.len()];

        let passes: [fn(&str, ReviewField) -> bool; 2] = [exact_match, partial_match];
        for matcher in passes {
            for field in ReviewField::ordered() {
                if map.columns[field.index()].is_some() {
                    continue;
                }
                let found = normalized
                    .iter()
                    .enumerate()
                    .find(|(index, header)| !claimed[*index] && matcher(header, field))
                    .map(|(index, _)| index);
                if let Some(index) = found {
                    claimed[index] = true;
                    map.columns[field.index()] = Some(index);
                }
            }
        }

        map
    }

    pub fn get(&self, field: ReviewField) -> Option<usize> {
        self.columns[field.index()]
    }

    pub fn missing(&self) -> Vec<ReviewField> {
        ReviewField::ordered()
            .into_iter()
            .filter(|field| self.get(*field).is_none())
            .collect()
    }
}
