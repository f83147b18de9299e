use chrono::{Datelike, NaiveDate};

use crate::error::{HabitError, HabitResult};

// Years outside 0000..=9999 use the ISO 8601 expanded form (`+10000-01-01`).
pub fn to_key(date: NaiveDate) -> String {
    let year = date.year();
    if (0..=9999).contains(&year) {
        format!("{:04}-{:02}-{:02}", year, date.month(), date.day())
    } else {
        let sign = if year < 0 { '-' } else { '+' };
        format!(
            "{}{:04}-{:02}-{:02}",
            sign,
            year.unsigned_abs(),
            date.month(),
            date.day()
        )
    }
}

pub fn parse_key(key: &str) -> HabitResult<NaiveDate> {
    let invalid = |reason| HabitError::InvalidKey {
        key: key.to_string(),
        reason,
    };

    let (sign, body) = match key.as_bytes().first() {
        Some(b'+') => (1, &key[1..]),
        Some(b'-') => (-1, &key[1..]),
        _ => (0, key),
    };

    // body is `<year>-MM-DD` where year has exactly four digits unless signed.
    if !body.is_ascii() || body.len() < 6 {
        return Err(invalid("expected YYYY-MM-DD"));
    }
    let (year_part, month_day) = body.split_at(body.len() - 6);
    let md = month_day.as_bytes();
    if md[0] != b'-' || md[3] != b'-' {
        return Err(invalid("expected YYYY-MM-DD"));
    }
    let month_str = &month_day[1..3];
    let day_str = &month_day[4..6];

    // Expanded years carry no leading zeros past four digits, so every date
    // has exactly one spelling.
    let year_digits_ok = if sign == 0 {
        year_part.len() == 4
    } else {
        year_part.len() == 4 || (year_part.len() > 4 && !year_part.starts_with('0'))
    };
    if !year_digits_ok
        || !all_ascii_digits(year_part)
        || !all_ascii_digits(month_str)
        || !all_ascii_digits(day_str)
    {
        return Err(invalid("expected YYYY-MM-DD"));
    }

    let magnitude: i32 = year_part
        .parse()
        .map_err(|_| invalid("year out of range"))?;
    let year = if sign < 0 { -magnitude } else { magnitude };
    // An explicit sign is reserved for years the fixed-width form cannot hold.
    if sign != 0 && (0..=9999).contains(&year) {
        return Err(invalid("signed year inside the fixed-width range"));
    }
    let month: u32 = month_str.parse().map_err(|_| invalid("bad month"))?;
    let day: u32 = day_str.parse().map_err(|_| invalid("bad day"))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("no such calendar date"))
}

fn all_ascii_digits(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
