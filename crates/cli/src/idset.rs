use std::collections::BTreeSet;

use anyhow::{Context, Result, bail};
use quiz_core::model::QuestionId;

/// Widest range a single `lo-hi` entry may expand to. Far beyond any real
/// bank, but keeps `1-18446744073709551615` from allocating before the
/// first bank lookup.
const MAX_RANGE_SPAN: u64 = 10_000;

/// Expand a CLI id-set (`3`, `1,6,7`, `2-7`, or combinations like `1,4-6`)
/// into a concrete ordered set of ids.
///
/// This syntax never reaches the store; the core only ever sees the
/// expanded ids.
pub fn parse(input: &str) -> Result<Vec<QuestionId>> {
    let input = input.trim();
    if input.is_empty() {
        bail!("empty id set");
    }

    let mut ids = BTreeSet::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            bail!("empty entry in id set {input:?}");
        }
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_one(lo)?;
                let hi = parse_one(hi)?;
                if hi < lo {
                    bail!("descending id range {part:?}");
                }
                if hi - lo >= MAX_RANGE_SPAN {
                    bail!("id range {part:?} spans more than {MAX_RANGE_SPAN} ids");
                }
                ids.extend((lo..=hi).map(QuestionId::new));
            }
            None => {
                ids.insert(QuestionId::new(parse_one(part)?));
            }
        }
    }
    Ok(ids.into_iter().collect())
}

fn parse_one(raw: &str) -> Result<u64> {
    let id: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid question id {:?}", raw.trim()))?;
    if id == 0 {
        bail!("question ids start at 1");
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(input: &str) -> Vec<u64> {
        parse(input).unwrap().iter().map(QuestionId::value).collect()
    }

    #[test]
    fn single_id() {
        assert_eq!(values("3"), vec![3]);
    }

    #[test]
    fn comma_list_is_deduplicated_and_ordered() {
        assert_eq!(values("7,1,6,7"), vec![1, 6, 7]);
    }

    #[test]
    fn inclusive_range() {
        assert_eq!(values("2-7"), vec![2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn mixed_list_and_range() {
        assert_eq!(values("1, 4-6"), vec![1, 4, 5, 6]);
    }

    #[test]
    fn rejects_ranges_wider_than_the_span_cap() {
        assert!(parse("1-18446744073709551615").is_err());
        assert!(parse("1-10001").is_err());
        assert!(parse("1-10000").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("a-b").is_err());
        assert!(parse("5-2").is_err());
        assert!(parse("1,,2").is_err());
        assert!(parse("0").is_err());
    }
}
