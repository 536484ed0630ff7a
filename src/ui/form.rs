//! Editable search form fields over [`SearchParams`].

use crate::model::{Choice, Recency, SearchParams};

/// Upper bound while typing; the API itself caps results at 50.
const MAX_RESULTS_INPUT: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Term,
    MaxResults,
    Order,
    Type,
    Duration,
    Definition,
    Region,
    Recency,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Term,
        FormField::MaxResults,
        FormField::Order,
        FormField::Type,
        FormField::Duration,
        FormField::Definition,
        FormField::Region,
        FormField::Recency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Term => "Search",
            FormField::MaxResults => "Max",
            FormField::Order => "Order",
            FormField::Type => "Type",
            FormField::Duration => "Duration",
            FormField::Definition => "Quality",
            FormField::Region => "Region",
            FormField::Recency => "Published",
        }
    }

    /// Free text rather than a fixed set of choices.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            FormField::Term | FormField::MaxResults | FormField::Region
        )
    }

    pub fn value(self, params: &SearchParams) -> String {
        match self {
            FormField::Term => params.term.clone(),
            FormField::MaxResults => params.max_results.to_string(),
            FormField::Order => params.order.as_str().to_string(),
            FormField::Type => params.result_type.as_str().to_string(),
            FormField::Duration => params.duration.as_str().to_string(),
            FormField::Definition => params.definition.as_str().to_string(),
            FormField::Region => params.region_code.clone(),
            FormField::Recency => match params.recency {
                Recency::Any => "any time".to_string(),
                Recency::Day => "last 24h".to_string(),
                Recency::Week => "last 7 days".to_string(),
            },
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn is_last(self) -> bool {
        self == Self::ALL[Self::ALL.len() - 1]
    }

    pub fn insert_char(self, params: &mut SearchParams, c: char) {
        match self {
            FormField::Term => params.term.push(c),
            FormField::MaxResults => {
                if let Some(d) = c.to_digit(10) {
                    let next = params.max_results.saturating_mul(10).saturating_add(d);
                    if next <= MAX_RESULTS_INPUT {
                        params.max_results = next;
                    }
                }
            }
            FormField::Region => {
                if c.is_ascii_alphabetic() && params.region_code.len() < 2 {
                    params.region_code.push(c.to_ascii_uppercase());
                }
            }
            _ => {}
        }
    }

    pub fn backspace(self, params: &mut SearchParams) {
        match self {
            FormField::Term => {
                params.term.pop();
            }
            FormField::MaxResults => params.max_results /= 10,
            FormField::Region => {
                params.region_code.pop();
            }
            _ => {}
        }
    }

    /// Step a choice field forward (`true`) or back.
    pub fn cycle(self, params: &mut SearchParams, forward: bool) {
        fn step<C: Choice>(value: &mut C, forward: bool) {
            *value = if forward { value.next() } else { value.prev() };
        }
        match self {
            FormField::Order => step(&mut params.order, forward),
            FormField::Type => step(&mut params.result_type, forward),
            FormField::Duration => step(&mut params.duration, forward),
            FormField::Definition => step(&mut params.definition, forward),
            FormField::Recency => step(&mut params.recency, forward),
            _ => {}
        }
    }
}
