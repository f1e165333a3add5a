//! Ordinary least squares trend over daily closes

use chrono::Duration;
use common::decimal::precision::round_cash;
use common::decimal::{Decimal, Price};
use common::error::{Error, Result};

use crate::models::{PricePoint, Prediction};

/// Decimal places kept on the fitted coefficients
const COEFFICIENT_PRECISION: u32 = 4;

/// Fitted line `price = slope * index + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: Decimal,
    pub intercept: Decimal,
}

impl LinearFit {
    /// Value of the line at `index`
    pub fn at(&self, index: usize) -> Decimal {
        self.slope * Decimal::from(index) + self.intercept
    }
}

/// Least-squares fit of `ys` against their indices `0..n`
pub fn linear_regression(ys: &[Price]) -> Result<LinearFit> {
    let n = Decimal::from(ys.len());

    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_xx = Decimal::ZERO;
    for (i, y) in ys.iter().enumerate() {
        let x = Decimal::from(i);
        sum_x = checked(sum_x.checked_add(x))?;
        sum_y = checked(sum_y.checked_add(*y))?;
        sum_xy = checked(sum_xy.checked_add(checked(x.checked_mul(*y))?))?;
        sum_xx = checked(sum_xx.checked_add(x * x))?;
    }

    let denominator = checked(n.checked_mul(sum_xx))? - sum_x * sum_x;
    if denominator.is_zero() {
        return Err(Error::ValidationError(format!(
            "Cannot fit a trend to {} point(s)", ys.len()
        )));
    }

    let numerator = checked(n.checked_mul(sum_xy))? - checked(sum_x.checked_mul(sum_y))?;
    let slope = checked(numerator.checked_div(denominator))?;
    let intercept = checked((sum_y - slope * sum_x).checked_div(n))?;

    Ok(LinearFit { slope, intercept })
}

fn checked(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| Error::DecimalError("Regression overflowed".to_string()))
}

/// Fit a trend to `history` and extrapolate one day past its end
pub fn predict(symbol: &str, history: Vec<PricePoint>) -> Result<Prediction> {
    let prices: Vec<Price> = history.iter().map(|p| p.price).collect();
    let fit = linear_regression(&prices)?;

    let last_date = history
        .last()
        .map(|p| p.date)
        .ok_or_else(|| Error::ValidationError("Empty price history".to_string()))?;

    let predicted = history
        .iter()
        .enumerate()
        .map(|(i, point)| PricePoint {
            date: point.date,
            price: round_cash(fit.at(i)),
        })
        .collect();

    Ok(Prediction {
        symbol: symbol.to_string(),
        next_day: last_date + Duration::days(1),
        next_day_prediction: round_cash(fit.at(history.len())),
        slope: fit.slope.round_dp(COEFFICIENT_PRECISION),
        intercept: fit.intercept.round_dp(COEFFICIENT_PRECISION),
        predicted,
        actual: history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::decimal::dec;

    fn history(prices: &[Price]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                date: start + Duration::days(i as i64),
                price: *price,
            })
            .collect()
    }

    #[test]
    fn test_perfect_line_is_recovered() {
        let fit = linear_regression(&[dec!(10), dec!(12), dec!(14), dec!(16)]).unwrap();
        assert_eq!(fit.slope, dec!(2));
        assert_eq!(fit.intercept, dec!(10));
        assert_eq!(fit.at(4), dec!(18));
    }

    #[test]
    fn test_noisy_fit() {
        // x = 0..4, y = 1, 3, 2, 4: slope 0.8, intercept 1.3
        let fit = linear_regression(&[dec!(1), dec!(3), dec!(2), dec!(4)]).unwrap();
        assert_eq!(fit.slope, dec!(0.8));
        assert_eq!(fit.intercept, dec!(1.3));
    }

    #[test]
    fn test_flat_prices_have_zero_slope() {
        let fit = linear_regression(&[dec!(5.00); 6]).unwrap();
        assert!(fit.slope.is_zero());
        assert_eq!(fit.intercept, dec!(5));
    }

    #[test]
    fn test_single_point_is_degenerate() {
        assert!(matches!(linear_regression(&[dec!(5)]), Err(Error::ValidationError(_))));
        assert!(matches!(linear_regression(&[]), Err(Error::ValidationError(_))));
    }

    #[test]
    fn test_prediction_extrapolates_past_last_observation() {
        let prediction = predict("AAPL", history(&[dec!(100), dec!(101), dec!(102)])).unwrap();

        assert_eq!(prediction.actual.len(), 3);
        assert_eq!(prediction.predicted.len(), 3);
        assert_eq!(prediction.predicted[2].price, dec!(102.00));
        assert_eq!(prediction.next_day_prediction, dec!(103.00));
        assert_eq!(prediction.next_day, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(prediction.slope, dec!(1));
    }
}
