// src/suggest.rs
//! Alternate phrasings offered when a search comes back empty.

const MAX_SUGGESTIONS: usize = 2;

fn has_token(tokens: &[&str], prefix: &str) -> bool {
    tokens.iter().any(|t| t.starts_with(prefix))
}

/// Up to two alternative queries. Brand prefixes for GPU families, a
/// "processor"/"cpu" suffix for CPU families.
pub fn suggest_alternatives(query: &str) -> Vec<String> {
    let q = query.trim().to_lowercase();
    let tokens: Vec<&str> = q.split_whitespace().collect();
    let mut out = Vec::new();

    let mut prefix_family = |family: &str, brands: [&str; 2]| {
        for brand in brands {
            out.push(q.replacen(family, &format!("{brand} {family}"), 1));
        }
    };

    if has_token(&tokens, "rtx") {
        prefix_family("rtx", ["geforce", "nvidia"]);
    } else if has_token(&tokens, "gtx") {
        prefix_family("gtx", ["geforce", "nvidia"]);
    } else if has_token(&tokens, "rx") {
        prefix_family("rx", ["radeon", "amd"]);
    }

    let cpu = ["i3", "i5", "i7", "i9", "ryzen"]
        .iter()
        .any(|c| has_token(&tokens, c));
    if cpu {
        out.push(format!("{q} processor"));
        out.push(format!("{q} cpu"));
    }

    out.retain(|s| *s != q);
    out.dedup();
    out.truncate(MAX_SUGGESTIONS);
    out
}
