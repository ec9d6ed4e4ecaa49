//! DateTime Module
//!
//! Excelシリアル値と日付・時刻の相互変換、および日付トークンの描画を提供します。

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use super::tokens::{AmPmStyle, ElapsedUnit, FormatToken};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Excelシリアル値を日時に変換
///
/// 1900年方式ではシリアル値1が1900-01-01、60と61はどちらも1900-03-01になる
/// （Excelに存在する1900-02-29を実在の日付に寄せる）。
/// 1904年方式ではシリアル値0が1904-01-01。
///
/// # 引数
///
/// * `serial` - Excelシリアル値
/// * `is_1904` - 1904年方式か
/// * `sub_second_digits` - 表示する秒の小数桁数（0なら秒単位に丸める）
///
/// # 戻り値
///
/// 負のシリアル値や表現できない日付の場合は`None`
pub(crate) fn serial_to_datetime(
    serial: f64,
    is_1904: bool,
    sub_second_digits: usize,
) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let whole_days = serial.floor();
    let mut millis = ((serial - whole_days) * MILLIS_PER_DAY + 0.5) as i64;
    let unit = 10_i64.pow(3 - sub_second_digits.min(3) as u32);
    millis = (millis + unit / 2) / unit * unit;

    let whole_days = whole_days as i64;
    let (start, offset) = if is_1904 {
        (NaiveDate::from_ymd_opt(1904, 1, 1)?, whole_days)
    } else if whole_days < 61 {
        (NaiveDate::from_ymd_opt(1899, 12, 31)?, whole_days)
    } else {
        (NaiveDate::from_ymd_opt(1899, 12, 31)?, whole_days - 1)
    };

    let date = start.checked_add_signed(Duration::try_days(offset)?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_milliseconds(millis)?)
}

/// 経過時間用に、シリアル値を指定単位の合計値に変換
fn elapsed_total(serial: f64, unit: ElapsedUnit) -> i64 {
    let seconds = (serial * 86_400.0).round() as i64;
    match unit {
        ElapsedUnit::Hours => seconds.div_euclid(3600),
        ElapsedUnit::Minutes => seconds.div_euclid(60),
        ElapsedUnit::Seconds => seconds,
    }
}

fn pad(value: i64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// 日付・時刻セクションのトークン列を描画
///
/// # 引数
///
/// * `tokens` - セクションのトークン列
/// * `serial` - Excelシリアル値（経過時間の計算に使用）
/// * `datetime` - `serial_to_datetime`で変換済みの日時
pub(crate) fn render_datetime(tokens: &[FormatToken], serial: f64, datetime: &NaiveDateTime) -> String {
    let twelve_hour = tokens.iter().any(|t| matches!(t, FormatToken::AmPm(_)));
    // [h]:mm のように経過時間の後に続く分・秒は、その単位内での剰余になる
    let elapsed_seconds = (serial * 86_400.0).round() as i64;
    let has_elapsed = tokens.iter().any(|t| matches!(t, FormatToken::Elapsed(..)));

    let mut result = String::new();
    for token in tokens {
        match token {
            FormatToken::Year(count) => {
                if *count <= 2 {
                    result.push_str(&pad(i64::from(datetime.year() % 100), 2));
                } else {
                    result.push_str(&pad(i64::from(datetime.year()), 4));
                }
            }
            FormatToken::Month(count) => {
                let month = datetime.month();
                let name = MONTH_NAMES[(month - 1) as usize];
                match count {
                    1 => result.push_str(&month.to_string()),
                    2 => result.push_str(&pad(i64::from(month), 2)),
                    3 => result.push_str(&name[..3]),
                    4 => result.push_str(name),
                    _ => result.push_str(&name[..1]),
                }
            }
            FormatToken::Day(count) => {
                let weekday = WEEKDAY_NAMES[datetime.weekday().num_days_from_monday() as usize];
                match count {
                    1 => result.push_str(&datetime.day().to_string()),
                    2 => result.push_str(&pad(i64::from(datetime.day()), 2)),
                    3 => result.push_str(&weekday[..3]),
                    _ => result.push_str(weekday),
                }
            }
            FormatToken::Hour(count) => {
                let mut hour = datetime.hour();
                if twelve_hour {
                    hour %= 12;
                    if hour == 0 {
                        hour = 12;
                    }
                }
                result.push_str(&pad(i64::from(hour), (*count).min(2)));
            }
            FormatToken::Minute(count) => {
                let minute = if has_elapsed {
                    elapsed_seconds.div_euclid(60).rem_euclid(60)
                } else {
                    i64::from(datetime.minute())
                };
                result.push_str(&pad(minute, (*count).min(2)));
            }
            FormatToken::Second(count) => {
                let second = if has_elapsed {
                    elapsed_seconds.rem_euclid(60)
                } else {
                    i64::from(datetime.second())
                };
                result.push_str(&pad(second, (*count).min(2)));
            }
            FormatToken::SubSecond(digits) => {
                let millis = i64::from(datetime.nanosecond() / 1_000_000);
                let digits = (*digits).min(3);
                let value = millis / 10_i64.pow(3 - digits as u32);
                result.push('.');
                result.push_str(&pad(value, digits));
            }
            FormatToken::AmPm(style) => {
                let pm = datetime.hour() >= 12;
                let text = match style {
                    AmPmStyle::Full { .. } => {
                        if pm {
                            "PM"
                        } else {
                            "AM"
                        }
                    }
                    AmPmStyle::Short { .. } => {
                        if pm {
                            "P"
                        } else {
                            "A"
                        }
                    }
                };
                match style {
                    AmPmStyle::Full { lowercase: true } | AmPmStyle::Short { lowercase: true } => {
                        result.push_str(&text.to_ascii_lowercase())
                    }
                    _ => result.push_str(text),
                }
            }
            FormatToken::Elapsed(unit, width) => {
                result.push_str(&pad(elapsed_total(serial, *unit), *width));
            }
            FormatToken::Literal(s) => result.push_str(s),
            _ => {}
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(serial: f64, is_1904: bool) -> String {
        serial_to_datetime(serial, is_1904, 0)
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn test_serial_to_date_1900() {
        assert_eq!(ymd(1.0, false), "1900-01-01");
        assert_eq!(ymd(59.0, false), "1900-02-28");
        // Excelの存在しない1900-02-29
        assert_eq!(ymd(60.0, false), "1900-03-01");
        assert_eq!(ymd(61.0, false), "1900-03-01");
        assert_eq!(ymd(45658.0, false), "2025-01-01");
        assert_eq!(ymd(45979.0, false), "2025-11-18");
    }

    #[test]
    fn test_serial_to_date_1904() {
        assert_eq!(ymd(0.0, true), "1904-01-01");
        // 1900年方式との差は1462日
        assert_eq!(ymd(45658.0 - 1462.0, true), "2025-01-01");
    }

    #[test]
    fn test_negative_serial_is_invalid() {
        assert!(serial_to_datetime(-1.0, false, 0).is_none());
        assert!(serial_to_datetime(f64::NAN, false, 0).is_none());
    }

    #[test]
    fn test_time_rounding_to_seconds() {
        // 12:00:00.6 は 12:00:01 に丸められる
        let serial = 0.5 + 0.6 / 86_400.0;
        let dt = serial_to_datetime(serial, false, 0).unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "12:00:01");

        // 小数秒を表示する場合は丸めない
        let dt = serial_to_datetime(serial, false, 1).unwrap();
        assert_eq!(dt.nanosecond() / 1_000_000, 600);
    }

    #[test]
    fn test_time_rounding_carries_into_next_day() {
        let serial = 45658.0 + (86_399.7 / 86_400.0);
        let dt = serial_to_datetime(serial, false, 0).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-02 00:00:00");
    }

    #[test]
    fn test_render_names() {
        let dt = serial_to_datetime(45658.0, false, 0).unwrap();
        let tokens = vec![
            FormatToken::Day(4),
            FormatToken::Literal(", ".to_string()),
            FormatToken::Month(4),
            FormatToken::Literal(" ".to_string()),
            FormatToken::Day(1),
            FormatToken::Literal(" ".to_string()),
            FormatToken::Month(3),
            FormatToken::Month(5),
        ];
        assert_eq!(render_datetime(&tokens, 45658.0, &dt), "Wednesday, January 1 JanJ");
    }

    #[test]
    fn test_render_twelve_hour_clock() {
        let serial = 0.75; // 18:00
        let dt = serial_to_datetime(serial, false, 0).unwrap();
        let tokens = vec![
            FormatToken::Hour(1),
            FormatToken::Literal(":".to_string()),
            FormatToken::Minute(2),
            FormatToken::Literal(" ".to_string()),
            FormatToken::AmPm(AmPmStyle::Full { lowercase: false }),
        ];
        assert_eq!(render_datetime(&tokens, serial, &dt), "6:00 PM");
    }

    #[test]
    fn test_render_elapsed_hours() {
        // 1日と2時間30分
        let serial = 1.0 + 2.5 / 24.0;
        let dt = serial_to_datetime(serial, false, 0).unwrap();
        let tokens = vec![
            FormatToken::Elapsed(ElapsedUnit::Hours, 1),
            FormatToken::Literal(":".to_string()),
            FormatToken::Minute(2),
        ];
        assert_eq!(render_datetime(&tokens, serial, &dt), "26:30");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn later_serial_is_never_earlier_date(a in 0.0f64..2_958_465.0, b in 0.0f64..2_958_465.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for is_1904 in [false, true] {
                let lo_dt = serial_to_datetime(lo, is_1904, 0).unwrap();
                let hi_dt = serial_to_datetime(hi, is_1904, 0).unwrap();
                prop_assert!(lo_dt <= hi_dt);
            }
        }

        #[test]
        fn whole_days_are_midnight(day in 61u32..2_958_465) {
            let dt = serial_to_datetime(day as f64, false, 0).unwrap();
            prop_assert_eq!(dt.time(), chrono::NaiveTime::MIN);
            let next = serial_to_datetime(day as f64 + 1.0, false, 0).unwrap();
            prop_assert_eq!(next - dt, Duration::days(1));
        }
    }
}
