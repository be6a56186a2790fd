use super::rebalancing_model::{ConcentrationLevel, ConcentrationRisk};

/// Concentration of an allocation: HHI, a Gini-like spread measure and the
/// largest single position.
pub fn analyze_concentration<I>(weights: I) -> ConcentrationRisk
where
    I: IntoIterator<Item = f64>,
{
    let mut sorted: Vec<f64> = weights.into_iter().filter(|w| w.is_finite()).collect();
    if sorted.is_empty() {
        return ConcentrationRisk::unavailable();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let hhi: f64 = sorted.iter().map(|w| w * w).sum();
    let gini = sorted
        .iter()
        .enumerate()
        .map(|(idx, w)| {
            let i = (idx + 1) as f64;
            w * (2.0 * i - 1.0 - n)
        })
        .sum::<f64>()
        .abs()
        / n;
    let max_weight = sorted.last().copied().unwrap_or(0.0);

    let level = if hhi > 0.25 {
        ConcentrationLevel::High
    } else if hhi > 0.15 {
        ConcentrationLevel::Medium
    } else {
        ConcentrationLevel::Low
    };

    ConcentrationRisk {
        hhi: Some(hhi),
        gini_approx: Some(gini.clamp(0.0, 1.0)),
        max_single_asset_weight: Some(max_weight),
        effective_assets: (hhi > 0.0).then(|| 1.0 / hhi),
        level: Some(level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_asset_is_fully_concentrated() {
        let risk = analyze_concentration([1.0]);
        assert_eq!(risk.hhi, Some(1.0));
        assert_eq!(risk.level, Some(ConcentrationLevel::High));
        assert_eq!(risk.max_single_asset_weight, Some(1.0));
        assert_eq!(risk.effective_assets, Some(1.0));
    }

    #[test]
    fn test_equal_weights_have_zero_gini() {
        let risk = analyze_concentration(vec![0.1; 10]);
        assert!((risk.hhi.unwrap() - 0.1).abs() < 1e-12);
        assert!(risk.gini_approx.unwrap().abs() < 1e-12);
        assert_eq!(risk.level, Some(ConcentrationLevel::Low));
    }

    #[test]
    fn test_levels_and_gini() {
        // hhi = 0.49 + 0.04 + 0.01 = 0.54
        let risk = analyze_concentration([0.2, 0.7, 0.1]);
        assert!((risk.hhi.unwrap() - 0.54).abs() < 1e-12);
        assert_eq!(risk.level, Some(ConcentrationLevel::High));
        // sorted 0.1, 0.2, 0.7 -> |0.1*(-2) + 0.2*0 + 0.7*2| / 3 = 0.4
        assert!((risk.gini_approx.unwrap() - 0.4).abs() < 1e-12);

        // five equal weights: hhi = 0.2
        let medium = analyze_concentration([0.2; 5]);
        assert_eq!(medium.level, Some(ConcentrationLevel::Medium));
    }

    #[test]
    fn test_empty_is_unavailable() {
        assert_eq!(
            analyze_concentration(Vec::<f64>::new()),
            ConcentrationRisk::unavailable()
        );
    }
}
