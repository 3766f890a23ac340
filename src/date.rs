//! Release dates, and recovering the date of the last build from a
//! previously written build log.

use log::debug;
use time::{macros::format_description, Date, OffsetDateTime, PrimitiveDateTime};

use crate::error::Result;

/// The current local time. Falls back to UTC when the local offset can't be
/// determined.
pub fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
        debug!("Unable to get local time, using UTC: {e}");
        OffsetDateTime::now_utc()
    });
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Formats the date shown next to a release: `YYYY-MM-DD`, with `HH:MM`
/// added for incremental builds.
///
/// # Example
///
/// ```
/// # use ez_changelog::date::release_date;
/// # use time::macros::datetime;
/// assert_eq!("2016-10-08", release_date(datetime!(2016-10-08 21:30), false).unwrap());
/// assert_eq!("2016-10-08 21:30", release_date(datetime!(2016-10-08 21:30), true).unwrap());
/// ```
pub fn release_date(now: PrimitiveDateTime, incremental: bool) -> Result<String> {
    let date = if incremental {
        now.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))?
    } else {
        now.format(format_description!("[year]-[month]-[day]"))?
    };
    Ok(date)
}

/// Gets the date of the last build from a previously written log, i.e. the
/// text between the first `(` and the first `)`. Only the most recent
/// heading is expected to precede them; any other parenthesis before it
/// defeats this.
pub fn last_build_date(previous: &str) -> Option<PrimitiveDateTime> {
    let start = previous.find('(')?;
    let end = previous.find(')')?;
    let text = previous.get(start + 1..end)?.trim();

    PrimitiveDateTime::parse(text, format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .or_else(|_| Date::parse(text, format_description!("[year]-[month]-[day]")).map(Date::midnight))
        .map_err(|e| debug!("No build date in {text:?}: {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn release_date_is_padded() {
        assert_eq!(
            release_date(datetime!(2016-01-02 03:04), false).unwrap(),
            "2016-01-02"
        );
        assert_eq!(
            release_date(datetime!(2016-01-02 03:04), true).unwrap(),
            "2016-01-02 03:04"
        );
    }

    #[test]
    fn no_previous_log() {
        assert_eq!(last_build_date(""), None);
    }

    #[test]
    fn last_build_from_existing_log() {
        let old_log = "<a name=\"ez-changelog-v1.0.0.SNAPSHOT\"></a>\n\
                       # ez-changelog-v1.0.0.SNAPSHOT (2016-02-10 23:50)\n\
                       ## Breaking Changes\n";

        assert_eq!(last_build_date(old_log), Some(datetime!(2016-02-10 23:50)));
    }

    #[test]
    fn last_build_from_changelog_without_time() {
        let old_log = "<a name=\"v1.0.0\"></a>\n# v1.0.0 (2016-02-10)\n\n";

        assert_eq!(last_build_date(old_log), Some(datetime!(2016-02-10 00:00)));
    }

    #[test]
    fn last_build_needs_a_date_between_parens() {
        assert_eq!(last_build_date("# v1 (soon)\n"), None);
        assert_eq!(last_build_date("# v1 ) oops (2016-02-10)\n"), None);
        assert_eq!(last_build_date("# v1 (2016-02-10\n"), None);
    }
}
