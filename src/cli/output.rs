//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{FuzzyRankArgs, OutputFormat};
use crate::error::Result;
use crate::matcher::MatchDiagnostic;
use crate::record::{Record, RecordId};
use crate::search::AggregatedResult;

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub total_hits: usize,
    pub duration_ms: u64,
}

/// A single ranked record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: RecordId,
    pub score: f64,
    #[serde(rename = "modelName", default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub item: Record,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchDiagnostic>,
}

impl From<&AggregatedResult<'_>> for SearchHit {
    fn from(result: &AggregatedResult<'_>) -> Self {
        SearchHit {
            id: result.id.clone(),
            score: result.score,
            model_name: result.model_name.clone(),
            item: result.record.clone(),
            matches: result.matches.clone(),
        }
    }
}

/// Searchable fields of one record collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub fields: Vec<String>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn render_human(&self) -> String;
}

impl HumanOutput for SearchResults {
    fn render_human(&self) -> String {
        let mut out = String::new();
        out.push_str("Search Results:\n");
        out.push_str("═══════════════\n");

        for (i, hit) in self.hits.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("Result {}: (Score: {:.3})", i + 1, hit.score));
            if let Some(model) = &hit.model_name {
                out.push_str(&format!(" [{model}]"));
            }
            out.push_str(&format!(" id={}\n", hit.id));
            out.push_str("─────────────\n");

            for (name, value) in hit.item.fields() {
                match value.as_str() {
                    Some(text) => out.push_str(&format!("{name}: {text}\n")),
                    None => out.push_str(&format!("{name}: {value}\n")),
                }
            }

            for diagnostic in &hit.matches {
                let ranges: Vec<String> = diagnostic
                    .indices
                    .iter()
                    .map(|(start, end)| format!("{start}..={end}"))
                    .collect();
                out.push_str(&format!(
                    "  matched {} at {}\n",
                    diagnostic.key,
                    ranges.join(", ")
                ));
            }
        }

        out.push('\n');
        out.push_str(&format!("Total hits: {}\n", self.total_hits));
        out.push_str(&format!("Search time: {}ms\n", self.duration_ms));
        out
    }
}

impl HumanOutput for Vec<FieldList> {
    fn render_human(&self) -> String {
        let mut out = String::new();
        for list in self {
            match &list.model {
                Some(model) => out.push_str(&format!("{model}:\n")),
                None => out.push_str("Fields:\n"),
            }
            for field in &list.fields {
                out.push_str(&format!("  {field}\n"));
            }
        }
        out
    }
}

/// Output a result in the specified format.
pub fn output_result<T>(message: &str, result: &T, args: &FuzzyRankArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanOutput>(message: &str, result: &T, args: &FuzzyRankArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    print!("{}", result.render_human());
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &FuzzyRankArgs) -> Result<()> {
    println!("{}", to_json(result, args.pretty)?);
    Ok(())
}

/// Serialize a result, optionally pretty-printed.
pub fn to_json<T: Serialize>(result: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> SearchResults {
        let item = Record::builder()
            .add_integer("id", 2)
            .add_text("name", "Alpine Lodge")
            .build();
        SearchResults {
            query: "alpine".to_string(),
            hits: vec![SearchHit {
                id: RecordId::Integer(2),
                score: 0.0,
                model_name: Some("Hotel".to_string()),
                item,
                matches: Vec::new(),
            }],
            total_hits: 1,
            duration_ms: 3,
        }
    }

    #[test]
    fn test_render_search_results() {
        let text = results().render_human();
        assert!(text.contains("Result 1: (Score: 0.000) [Hotel] id=2"));
        assert!(text.contains("name: Alpine Lodge"));
        assert!(text.contains("Total hits: 1"));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&to_json(&results(), false).unwrap()).unwrap();
        let hit = &json["hits"][0];
        assert_eq!(hit["id"], 2);
        assert_eq!(hit["modelName"], "Hotel");
        assert_eq!(hit["item"]["name"], "Alpine Lodge");
        assert!(hit.get("matches").is_none());
    }

    #[test]
    fn test_render_fields() {
        let lists = vec![FieldList {
            model: Some("Hotel".to_string()),
            fields: vec!["id".to_string(), "name".to_string()],
        }];
        assert_eq!(lists.render_human(), "Hotel:\n  id\n  name\n");
    }
}
