//! # Claves Compuestas para Resultados Agrupados
//! src/jobs/payload.rs
//!
//! Los resultados agrupados por categoría usan una clave estructurada (tupla
//! ordenada de strings). Solo al serializar como clave de un mapa JSON se
//! convierte a texto, con el formato estable:
//!
//! ```text
//! ('Ohio', 'Age (years)', '18 - 24')
//! ```
//!
//! Dentro de cada parte `'` y `\` van escapados con `\`. La tupla vacía es
//! `()` y la de un elemento lleva coma final: `('Ohio',)`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;

const QUOTE: char = '\'';
const ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryKey(Vec<String>);

impl CategoryKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('(')?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_char(QUOTE)?;
            for c in part.chars() {
                if c == QUOTE || c == ESCAPE {
                    f.write_char(ESCAPE)?;
                }
                f.write_char(c)?;
            }
            f.write_char(QUOTE)?;
        }
        if self.0.len() == 1 {
            f.write_char(',')?;
        }
        f.write_char(')')
    }
}

impl FromStr for CategoryKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid category key: {}", s);

        let inner = s
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let mut parts = Vec::new();
        let mut chars = inner.chars().peekable();

        while chars.peek().is_some() {
            if chars.next() != Some(QUOTE) {
                return Err(invalid());
            }

            let mut part = String::new();
            loop {
                match chars.next() {
                    Some(ESCAPE) => match chars.next() {
                        Some(c) if c == QUOTE || c == ESCAPE => part.push(c),
                        _ => return Err(invalid()),
                    },
                    Some(QUOTE) => break,
                    Some(c) => part.push(c),
                    None => return Err(invalid()),
                }
            }
            parts.push(part);

            // Después de cada parte: fin, coma final (un elemento) o ", "
            match (chars.next(), chars.next()) {
                (None, _) => break,
                (Some(','), None) if parts.len() == 1 => break,
                (Some(','), Some(' ')) if chars.peek().is_some() => {}
                _ => return Err(invalid()),
            }
        }

        Ok(Self(parts))
    }
}

impl Serialize for CategoryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Promedio de los valores de cada grupo, ordenado por clave
pub fn mean_by_key<I>(rows: I) -> BTreeMap<CategoryKey, f64>
where
    I: IntoIterator<Item = (CategoryKey, f64)>,
{
    let mut sums: BTreeMap<CategoryKey, (f64, usize)> = BTreeMap::new();

    for (key, value) in rows {
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}
