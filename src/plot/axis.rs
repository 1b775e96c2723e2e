// ============================================================================
// Axes : bornes et labels
// ============================================================================
// Équivalent d'un "autofmt" de l'axe des dates : le format des labels
// dépend de la durée totale affichée.
//
// - < 1 jour : heures (10:15)
// - < 3 jours : jour + heure (02/01 10:15)
// - < 1 an : date complète (2024-01-02)
// - < 5 ans : mois (Jan 2024)
// - au-delà : année (2024)
// ============================================================================

use chrono::DateTime;

const DAY_SECS: f64 = 86_400.0;

/// Nombre de labels sur l'axe X
pub const X_LABEL_COUNT: usize = 5;

/// Format chrono des labels pour une durée donnée (en secondes)
pub fn time_format(span_secs: f64) -> &'static str {
    if span_secs < DAY_SECS {
        "%H:%M"
    } else if span_secs < 3.0 * DAY_SECS {
        "%d/%m %H:%M"
    } else if span_secs < 365.0 * DAY_SECS {
        "%Y-%m-%d"
    } else if span_secs < 5.0 * 365.0 * DAY_SECS {
        "%b %Y"
    } else {
        "%Y"
    }
}

/// Labels régulièrement espacés entre les bornes (timestamps Unix)
///
/// Ratatui répartit les labels uniformément sur l'axe : le i-ème label
/// correspond donc à la valeur min + i * (max - min) / (count - 1).
pub fn time_labels(bounds: [f64; 2], count: usize) -> Vec<String> {
    let [min, max] = bounds;
    let format = time_format(max - min);
    let steps = count.saturating_sub(1).max(1) as f64;

    (0..count)
        .map(|i| {
            let secs = min + (max - min) * i as f64 / steps;
            DateTime::from_timestamp(secs.round() as i64, 0)
                .map(|time| time.format(format).to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Labels de l'axe Y : min, milieu, max
pub fn value_labels(bounds: [f64; 2]) -> Vec<String> {
    let [min, max] = bounds;
    let decimals = if (max - min).abs() >= 100.0 { 0 } else { 2 };
    [min, (min + max) / 2.0, max]
        .iter()
        .map(|value| format!("{:.*}", decimals, value))
        .collect()
}

/// Bornes de l'axe X, élargies si tous les points ont le même instant
pub fn time_bounds(xs: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = min_max(xs).unwrap_or((0.0, DAY_SECS));
    if min == max {
        [min - DAY_SECS / 2.0, max + DAY_SECS / 2.0]
    } else {
        [min, max]
    }
}

/// Bornes de l'axe Y avec une marge de 5%
///
/// Une série entièrement positive ne descend pas sous 0.
pub fn value_bounds(ys: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = match min_max(ys) {
        Some(found) => found,
        None => return [0.0, 1.0],
    };

    let range = max - min;
    let margin = if range > 0.0 {
        range * 0.05
    } else if min != 0.0 {
        min.abs() * 0.05
    } else {
        1.0
    };

    let low = if min >= 0.0 {
        (min - margin).max(0.0)
    } else {
        min - margin
    };
    [low, max + margin]
}

/// Minimum et maximum en un seul passage
///
/// CONCEPT RUST : fold
/// - Accumule (min, max) sans allouer
fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((min, max)) => Some((min.min(v), max.max(v))),
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================
