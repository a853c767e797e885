//! CSV parsing for position snapshots and risk history.
//!
//! Headers are matched case-insensitively and accept the column names of the
//! legacy dashboard exports (`MarketValueUSD`, `Beta_SPX`, `Delta_Oil`, ...).

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rb_types::{
    AssetClass, DataError, InputError, PortfolioId, Position, PositionSet, RbResult, RiskHistory,
    RiskHistoryPoint,
};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

const TICKER: &[&str] = &["Ticker", "Symbol"];
const ASSET_CLASS: &[&str] = &["AssetClass", "Asset_Class"];
const MARKET_VALUE: &[&str] = &["MarketValue", "MarketValueUSD", "Market_Value"];
const BETA: &[&str] = &["Beta", "Beta_SPX"];
const DURATION: &[&str] = &["Duration"];
const OIL_DELTA: &[&str] = &["OilDelta", "Delta_Oil"];

const DATE: &[&str] = &["Date"];
const NAV: &[&str] = &["NAV"];
const VAR_99: &[&str] = &["VaR_99_USD", "VaR_99", "VaR"];
const ES_99: &[&str] = &["ES_99_USD", "ES_99", "ES"];
const DRAWDOWN: &[&str] = &["Drawdown_Pct", "Drawdown"];

/// Position of a logical column within a CSV header row
#[derive(Debug, Clone, Copy)]
struct Column {
    name: &'static str,
    index: usize,
}

fn find_column(headers: &StringRecord, aliases: &[&'static str]) -> Option<Column> {
    headers.iter().enumerate().find_map(|(index, header)| {
        aliases
            .iter()
            .find(|alias| header.trim().eq_ignore_ascii_case(alias))
            .map(|_| Column {
                name: aliases[0],
                index,
            })
    })
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Parse a positions table.
///
/// `Ticker`, `AssetClass` and `MarketValue` are required; the sensitivity
/// columns are optional and an empty cell means the position has no exposure
/// to that factor.
pub fn parse_positions<R: Read>(portfolio: PortfolioId, reader: R) -> RbResult<PositionSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError {
            message: format!("CSV header error: {}", e),
        })?
        .clone();

    let required = |aliases: &[&'static str]| {
        find_column(&headers, aliases).ok_or_else(|| InputError::MissingColumn {
            column: aliases[0].to_string(),
        })
    };
    let ticker = required(TICKER)?;
    let asset_class = required(ASSET_CLASS)?;
    let market_value = required(MARKET_VALUE)?;
    let beta = find_column(&headers, BETA);
    let duration = find_column(&headers, DURATION);
    let oil_delta = find_column(&headers, OIL_DELTA);

    let mut positions = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| DataError::ParseError {
            message: format!("CSV parsing error: {}", e),
        })?;

        let ticker_value = required_text(&record, row, ticker)?;
        let class = AssetClass::from_str(required_text(&record, row, asset_class)?).map_err(
            |_| InputError::InvalidField {
                row,
                column: asset_class.name.to_string(),
                message: "empty asset class".to_string(),
            },
        )?;

        let mut position = Position::new(
            ticker_value,
            class,
            required_decimal(&record, row, market_value)?,
        );
        position.beta = optional_decimal(&record, row, beta)?;
        position.duration = optional_decimal(&record, row, duration)?;
        position.oil_delta = optional_decimal(&record, row, oil_delta)?;

        positions.push(position);
    }

    PositionSet::new(portfolio, positions)
}

fn required_text<'r>(record: &'r StringRecord, row: usize, column: Column) -> RbResult<&'r str> {
    match record.get(column.index) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(InputError::InvalidField {
            row,
            column: column.name.to_string(),
            message: "value is required".to_string(),
        }
        .into()),
    }
}

fn required_decimal(record: &StringRecord, row: usize, column: Column) -> RbResult<Decimal> {
    let text = required_text(record, row, column)?;
    parse_decimal(text).ok_or_else(|| {
        InputError::InvalidField {
            row,
            column: column.name.to_string(),
            message: format!("not a number: {}", text),
        }
        .into()
    })
}

fn optional_decimal(
    record: &StringRecord,
    row: usize,
    column: Option<Column>,
) -> RbResult<Option<Decimal>> {
    let Some(column) = column else {
        return Ok(None);
    };
    match record.get(column.index) {
        None | Some("") => Ok(None),
        Some(text) if text.eq_ignore_ascii_case("nan") => Ok(None),
        Some(_) => required_decimal(record, row, column).map(Some),
    }
}

/// Parse a risk history table with `Date, NAV, VaR_99_USD, ES_99_USD, Drawdown_Pct`.
///
/// Without a drawdown column the drawdowns are derived from NAV.
pub fn parse_risk_history<R: Read>(portfolio: PortfolioId, reader: R) -> RbResult<RiskHistory> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError {
            message: format!("CSV header error: {}", e),
        })?
        .clone();

    let required = |aliases: &[&'static str]| {
        find_column(&headers, aliases).ok_or_else(|| DataError::ParseError {
            message: format!("risk history is missing column {}", aliases[0]),
        })
    };
    let date = required(DATE)?;
    let nav = required(NAV)?;
    let var_99 = required(VAR_99)?;
    let es_99 = required(ES_99)?;
    let drawdown = find_column(&headers, DRAWDOWN);

    let mut points = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| DataError::ParseError {
            message: format!("CSV parsing error: {}", e),
        })?;

        let decimal = |column: Column| -> Result<Decimal, DataError> {
            record
                .get(column.index)
                .and_then(parse_decimal)
                .ok_or_else(|| DataError::ParseError {
                    message: format!("row {}: invalid {}", row, column.name),
                })
        };

        let raw_date = record.get(date.index).unwrap_or_default();
        points.push(RiskHistoryPoint {
            date: parse_date(raw_date).ok_or_else(|| DataError::ParseError {
                message: format!("row {}: invalid date {}", row, raw_date),
            })?,
            nav: decimal(nav)?,
            var_99: decimal(var_99)?,
            es_99: decimal(es_99)?,
            drawdown_pct: match drawdown {
                Some(column) => decimal(column)?,
                None => Decimal::ZERO,
            },
        });
    }

    let history = RiskHistory::new(portfolio, points);
    Ok(match drawdown {
        Some(_) => history,
        None => history.with_nav_drawdowns(),
    })
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_types::RbError;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_legacy_export_columns() {
        let csv = "\
Ticker,AssetClass,MarketValueUSD,Beta_SPX,Duration,Delta_Oil
TICKER_0,Equity,100000.50,1.2,0,0
TICKER_1,Fixed Income,500000,0.05,5.25,
TICKER_2,Commodity,250000,,,0.3
";
        let set = parse_positions("Portfolio A".into(), csv.as_bytes()).unwrap();

        assert_eq!(set.len(), 3);
        let equity = set.get("TICKER_0").unwrap();
        assert_eq!(equity.market_value, dec!(100000.50));
        assert_eq!(equity.beta, Some(dec!(1.2)));

        let bond = set.get("TICKER_1").unwrap();
        assert_eq!(bond.asset_class, AssetClass::FixedIncome);
        assert_eq!(bond.duration, Some(dec!(5.25)));
        assert_eq!(bond.oil_delta, None);

        let oil = set.get("TICKER_2").unwrap();
        assert_eq!(oil.beta, None);
        assert_eq!(oil.oil_delta, Some(dec!(0.3)));
    }

    #[test]
    fn sensitivity_columns_are_optional() {
        let csv = "ticker,assetclass,marketvalue\nCASH,Cash,1000\n";
        let set = parse_positions("Portfolio A".into(), csv.as_bytes()).unwrap();
        let cash = set.get("CASH").unwrap();
        assert_eq!(cash.asset_class, AssetClass::Cash);
        assert!(cash.beta.is_none() && cash.duration.is_none() && cash.oil_delta.is_none());
    }

    #[test]
    fn missing_required_column_is_invalid_input() {
        let csv = "Ticker,AssetClass,Beta\nAAPL,Equity,1.2\n";
        let err = parse_positions("Portfolio A".into(), csv.as_bytes()).unwrap_err();
        match err {
            RbError::InvalidInput(InputError::MissingColumn { column }) => {
                assert_eq!(column, "MarketValue")
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn non_numeric_value_reports_row_and_column() {
        let csv = "Ticker,AssetClass,MarketValue,Beta\nAAPL,Equity,100,1.0\nMSFT,Equity,200,high\n";
        let err = parse_positions("Portfolio A".into(), csv.as_bytes()).unwrap_err();
        match err {
            RbError::InvalidInput(InputError::InvalidField { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Beta");
            }
            other => panic!("expected invalid field, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_ticker_rejected() {
        let csv = "Ticker,AssetClass,MarketValue\nAAPL,Equity,100\nAAPL,Equity,200\n";
        let err = parse_positions("Portfolio A".into(), csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RbError::InvalidInput(InputError::DuplicateTicker { .. })
        ));
    }

    #[test]
    fn parses_risk_history() {
        let csv = "\
Date,NAV,VaR_99_USD,ES_99_USD,Drawdown_Pct
2024-01-03,101000000,2000000,2600000,-0.01
2024-01-02 00:00:00,102000000,2100000,2700000,0
";
        let history = parse_risk_history("Portfolio A".into(), csv.as_bytes()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.first_date(), NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(history.latest().unwrap().drawdown_pct, dec!(-0.01));
    }

    #[test]
    fn risk_history_without_drawdown_derives_it_from_nav() {
        let csv = "\
Date,NAV,VaR_99_USD,ES_99_USD
2024-01-02,1000000,20000,26000
2024-01-03,1250000,25000,32500
2024-01-04,1000000,30000,39000
";
        let history = parse_risk_history("Portfolio A".into(), csv.as_bytes()).unwrap();
        let drawdowns: Vec<Decimal> = history.points().iter().map(|p| p.drawdown_pct).collect();
        assert_eq!(drawdowns, vec![dec!(0), dec!(0), dec!(-0.2)]);
    }

    #[test]
    fn risk_history_bad_date_is_parse_error() {
        let csv = "Date,NAV,VaR_99_USD,ES_99_USD,Drawdown_Pct\nyesterday,1,1,1,0\n";
        let err = parse_risk_history("Portfolio A".into(), csv.as_bytes()).unwrap_err();
        assert!(matches!(err, RbError::Data(DataError::ParseError { .. })));
    }
}
