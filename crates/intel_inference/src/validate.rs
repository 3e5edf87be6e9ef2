use serde_json::Value;

use intel_core::{AnalysisResult, Classification, Entity, EntityType, Error, Result};

const MIN_SUMMARY_CHARS: usize = 20;
const MIN_SENTIMENT: i64 = 1;
const MAX_SENTIMENT: i64 = 10;

/// Extracts and validates a structured analysis from raw inference output.
///
/// The model is instructed to emit only the JSON object, but some models wrap
/// it in commentary, so the candidate span runs from the first `{` to the
/// last `}`. This scan does not track nesting and is defeated by stray braces
/// inside string values; the system prompt keeps that case rare.
///
/// Validation checks every field and fails on the first violated constraint,
/// naming the offending field. A result is either fully valid or rejected.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let span = extract_json_span(raw).ok_or_else(|| {
        Error::validation("response", "no JSON object found in inference output")
    })?;

    let value: Value = serde_json::from_str(span)
        .map_err(|e| Error::validation("response", format!("invalid JSON: {}", e)))?;

    let summary = validate_summary(&value)?;
    let entities = validate_entities(&value)?;
    let classification = validate_classification(&value)?;
    let sentiment_score = validate_sentiment(&value)?;

    Ok(AnalysisResult {
        summary,
        entities,
        classification,
        sentiment_score,
    })
}

fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn validate_summary(value: &Value) -> Result<String> {
    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation("summary", "missing or not a string"))?;
    if summary.chars().count() < MIN_SUMMARY_CHARS {
        return Err(Error::validation(
            "summary",
            format!("must be at least {} characters", MIN_SUMMARY_CHARS),
        ));
    }
    Ok(summary.to_string())
}

fn validate_entities(value: &Value) -> Result<Vec<Entity>> {
    let raw = match value.get("entities") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(raw) => raw,
    };
    let items = raw
        .as_array()
        .ok_or_else(|| Error::validation("entities", "not an array"))?;

    let mut entities = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let text = item
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::validation(format!("entities[{}].text", i), "missing or not a string")
            })?;
        if text.trim().is_empty() {
            return Err(Error::validation(
                format!("entities[{}].text", i),
                "must not be empty",
            ));
        }

        let entity_type: EntityType = item
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::validation(format!("entities[{}].type", i), "missing or not a string")
            })?
            .parse()
            .map_err(|_| {
                Error::validation(
                    format!("entities[{}].type", i),
                    "must be one of company|person|product|technology",
                )
            })?;

        let mentions = item
            .get("mentions")
            .and_then(Value::as_u64)
            .filter(|m| *m >= 1)
            .ok_or_else(|| {
                Error::validation(format!("entities[{}].mentions", i), "must be an integer >= 1")
            })?;

        entities.push(Entity {
            text: text.to_string(),
            entity_type,
            mentions: mentions.min(u32::MAX as u64) as u32,
        });
    }
    Ok(entities)
}

fn validate_classification(value: &Value) -> Result<Classification> {
    value
        .get("classification")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::validation("classification", "missing or not a string"))?
        .parse()
        .map_err(|_| {
            Error::validation(
                "classification",
                "must be one of competitive_news|personnel_change|product_launch|market_trend",
            )
        })
}

fn validate_sentiment(value: &Value) -> Result<u8> {
    let score = value
        .get("sentimentScore")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::validation("sentimentScore", "missing or not an integer"))?;
    if !(MIN_SENTIMENT..=MAX_SENTIMENT).contains(&score) {
        return Err(Error::validation(
            "sentimentScore",
            format!("must be between {} and {}", MIN_SENTIMENT, MAX_SENTIMENT),
        ));
    }
    Ok(score as u8)
}
