//! Canonical ordering of the text exposition.
//!
//! The exporter renders families and series in hash-map order, which changes
//! between renders. [`canonicalize`] rewrites a rendering so that families
//! are sorted by name and series by their labels. The lines of one series
//! (histogram buckets, summary quantiles, `_sum` and `_count`) stay together
//! and keep their original order.

/// One metric family: its `# HELP`/`# TYPE` lines and its sample lines.
struct Family<'a> {
    name: &'a str,
    headers: Vec<&'a str>,
    samples: Vec<&'a str>,
}

/// Reorders `text` into canonical order.
pub(crate) fn canonicalize(text: &str) -> String {
    let mut families: Vec<Family<'_>> = Vec::new();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(name) = header_name(line) {
            // TYPE right after HELP belongs to the same family
            match families.last_mut() {
                Some(current) if current.name == name && current.samples.is_empty() => {
                    current.headers.push(line);
                }
                _ => families.push(Family {
                    name,
                    headers: vec![line],
                    samples: Vec::new(),
                }),
            }
            continue;
        }

        match families.last_mut() {
            Some(current) => current.samples.push(line),
            None => families.push(Family {
                name: sample_name(line),
                headers: Vec::new(),
                samples: vec![line],
            }),
        }
    }

    families.sort_by(|a, b| a.name.cmp(b.name));

    let mut output = String::with_capacity(text.len());
    for family in &families {
        for header in &family.headers {
            output.push_str(header);
            output.push('\n');
        }
        for line in sorted_series(&family.samples) {
            output.push_str(line);
            output.push('\n');
        }
        output.push('\n');
    }
    output
}

/// Groups consecutive lines of the same series and sorts the groups.
fn sorted_series<'a>(samples: &[&'a str]) -> Vec<&'a str> {
    let mut groups: Vec<(String, Vec<&'a str>)> = Vec::new();

    for &line in samples {
        let key = series_key(line);
        match groups.last_mut() {
            Some((current, lines)) if *current == key => lines.push(line),
            _ => groups.push((key, vec![line])),
        }
    }

    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups.into_iter().flat_map(|(_, lines)| lines).collect()
}

fn header_name(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("# HELP ")
        .or_else(|| line.strip_prefix("# TYPE "))?;
    rest.split_whitespace().next()
}

fn sample_name(line: &str) -> &str {
    let end = line.find(['{', ' ']).unwrap_or(line.len());
    &line[..end]
}

/// Label pairs of a sample without `le` and `quantile`, joined back.
fn series_key(line: &str) -> String {
    label_pairs(line)
        .into_iter()
        .filter(|pair| !pair.starts_with("le=") && !pair.starts_with("quantile="))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits `name{a="x",b="y"} v` into `a="x"` and `b="y"`.
///
/// Commas and braces inside quoted values are not separators.
fn label_pairs(line: &str) -> Vec<&str> {
    let name = sample_name(line);
    let Some(body) = line[name.len()..].strip_prefix('{') else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut from = 0;

    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                pairs.push(&body[from..i]);
                from = i + 1;
            }
            '}' if !quoted => {
                if from < i {
                    pairs.push(&body[from..i]);
                }
                break;
            }
            _ => {}
        }
    }
    pairs
}
