use anyhow::{Result, bail};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse seed tokens; negative numbers are folded to their magnitude.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in tokens {
        if let Ok(value) = token.parse::<u64>() {
            seeds.push(value);
        } else if let Ok(value) = token.parse::<i64>() {
            seeds.push(value.unsigned_abs());
        } else if let Some(hex) = token.strip_prefix("0x")
            && let Ok(value) = u64::from_str_radix(hex, 16)
        {
            seeds.push(value);
        } else {
            bail!("invalid seed {token:?}");
        }
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}
