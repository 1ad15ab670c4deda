#![allow(dead_code)]
//! Helpers to read values back out of exposition text.

use pulse_metrics::{Label, LabelSet};

/// One parsed sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
}

/// Parses every sample line, skipping `# HELP` / `# TYPE` comments.
pub fn samples(body: &str) -> Vec<Sample> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Sample {
    let (series, value) = line.rsplit_once(' ').expect("sample without value");
    let value = match value {
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        v => v.parse().expect("sample value is not a number"),
    };

    let (name, labels) = match series.split_once('{') {
        Some((name, rest)) => (name, parse_labels(rest.trim_end_matches('}'))),
        None => (series, Vec::new()),
    };

    Sample {
        name: name.to_string(),
        labels,
        value,
    }
}

fn parse_labels(raw: &str) -> Vec<(String, String)> {
    raw.split("\",")
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once("=\"").expect("label without value");
            (key.to_string(), value.trim_end_matches('"').to_string())
        })
        .collect()
}

/// Finds the sample with exactly these labels, in this order.
pub fn value(body: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    samples(body)
        .into_iter()
        .find(|s| {
            s.name == name
                && s.labels.len() == labels.len()
                && s.labels
                    .iter()
                    .zip(labels)
                    .all(|((k, v), (ek, ev))| k == ek && v == ev)
        })
        .map(|s| s.value)
}

/// Returns `(le, count)` pairs of a histogram series, in rendered order.
pub fn buckets(body: &str, name: &str, labels: &[(&str, &str)]) -> Vec<(f64, f64)> {
    let bucket_name = format!("{}_bucket", name);
    samples(body)
        .into_iter()
        .filter(|s| s.name == bucket_name)
        .filter(|s| {
            labels
                .iter()
                .all(|(k, v)| s.labels.iter().any(|(sk, sv)| sk == k && sv == v))
        })
        .map(|s| {
            let le = s
                .labels
                .iter()
                .find(|(k, _)| k == "le")
                .map(|(_, v)| v.as_str())
                .expect("bucket without le");
            let le = if le == "+Inf" {
                f64::INFINITY
            } else {
                le.parse().expect("le is not a number")
            };
            (le, s.value)
        })
        .collect()
}

/// `{route}` labels used throughout the tests.
pub struct Route(pub &'static str);

impl LabelSet for Route {
    fn labels(&self) -> Vec<Label> {
        vec![Label::new("route", self.0)]
    }
}
