use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::geo;
use crate::models::{Personal, Profile};

/// Everything about the caller that candidate ranking needs. The exclusion
/// sets (liked, likers, ever-matched) are applied at the query level before
/// rows reach this module.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user_id: Uuid,
    pub interests: Vec<String>,
    pub geolocation: Option<(f64, f64)>,
    pub residence: Option<String>,
    pub max_distance: f64,
    pub age_range: Option<(i32, i32)>,
}

/// A ranked swipe-deck entry.
#[derive(Debug, Serialize, Clone)]
pub struct Candidate {
    pub user_id: Uuid,
    pub name: String,
    pub age: i32,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub images: Vec<String>,
    /// Rounded miles; null when neither geolocation nor residence gave a fix.
    pub distance: Option<i32>,
    pub match_score: usize,
}

pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    use chrono::Datelike;
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// Shared-interest count, case-insensitive.
pub fn shared_interests(mine: &[String], theirs: &[String]) -> usize {
    theirs
        .iter()
        .filter(|t| mine.iter().any(|m| m.trim().eq_ignore_ascii_case(t.trim())))
        .count()
}

fn build_candidate(
    viewer: &Viewer,
    personal: &Personal,
    profile: &Profile,
    distance: Option<f64>,
    today: NaiveDate,
) -> Candidate {
    Candidate {
        user_id: personal.user_id,
        name: personal.display_name.clone(),
        age: age_on(personal.birth_date, today),
        bio: profile.bio.clone(),
        interests: profile.interest_list(),
        images: profile.image_list(),
        distance: distance.map(|d| d.round() as i32),
        match_score: shared_interests(&viewer.interests, &profile.interest_list()),
    }
}

fn passes_filters(viewer: &Viewer, candidate: &Candidate, raw_distance: Option<f64>) -> bool {
    // Unknown distance passes: "distance null means don't filter out".
    if let Some(d) = raw_distance {
        if d > viewer.max_distance {
            return false;
        }
    }

    if let Some((min, max)) = viewer.age_range {
        if candidate.age < min || candidate.age > max {
            return false;
        }
    }

    true
}

/// Score, filter, and order candidate rows into a swipe page.
///
/// Sort is by shared-interest count descending; the sort is stable so equal
/// scores keep the query order.
pub fn rank(
    viewer: &Viewer,
    rows: &[(Personal, Profile)],
    today: NaiveDate,
    limit: usize,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = rows
        .iter()
        .filter(|(p, _)| p.user_id != viewer.user_id)
        .filter_map(|(personal, profile)| {
            let raw_distance = geo::distance_between(
                viewer.geolocation,
                viewer.residence.as_deref(),
                profile.geolocation(),
                profile.residence.as_deref(),
            );
            let candidate = build_candidate(viewer, personal, profile, raw_distance, today);
            passes_filters(viewer, &candidate, raw_distance).then_some(candidate)
        })
        .collect();

    candidates.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn personal(name: &str, birth: NaiveDate) -> Personal {
        Personal {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            sex: "female".to_string(),
            birth_date: birth,
            created_at: Utc::now(),
        }
    }

    fn profile(
        user_id: Uuid,
        interests: &[&str],
        geo: Option<(f64, f64)>,
        residence: Option<&str>,
    ) -> Profile {
        Profile {
            user_id,
            bio: None,
            interests: serde_json::json!(interests),
            image_urls: serde_json::json!(["1.jpg", "2.jpg", "3.jpg"]),
            residence: residence.map(str::to_string),
            latitude: geo.map(|g| g.0),
            longitude: geo.map(|g| g.1),
            updated_at: Utc::now(),
        }
    }

    fn viewer() -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            interests: vec!["hiking".into(), "coffee".into()],
            geolocation: Some((40.0, -75.0)),
            residence: None,
            max_distance: 50.0,
            age_range: None,
        }
    }

    fn row(name: &str, birth: NaiveDate, interests: &[&str], geo: Option<(f64, f64)>) -> (Personal, Profile) {
        let p = personal(name, birth);
        let prof = profile(p.user_id, interests, geo, None);
        (p, prof)
    }

    #[test]
    fn age_counts_completed_years_only() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 24);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 25);
    }

    #[test]
    fn shared_interests_ignores_case() {
        let mine = vec!["Hiking".to_string(), "coffee".to_string()];
        let theirs = vec!["hiking".to_string(), "movies".to_string()];
        assert_eq!(shared_interests(&mine, &theirs), 1);
    }

    #[test]
    fn example_scenario_ranks_by_shared_interests() {
        // Viewer: interests [hiking, coffee], max distance 50mi, at [40.0,-75.0].
        // Candidate A: [hiking, movies] at [40.1,-75.1] -> included, score 1, ~9mi.
        // Candidate B: [movies] nearby -> included, score 0, sorted below A.
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        let a = row("a", birth, &["hiking", "movies"], Some((40.1, -75.1)));
        let b = row("b", birth, &["movies"], Some((40.05, -75.02)));
        let rows = vec![b, a];

        let ranked = rank(&viewer(), &rows, today, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "a");
        assert_eq!(ranked[0].match_score, 1);
        assert_eq!(ranked[0].distance, Some(9));
        assert_eq!(ranked[1].match_score, 0);
    }

    #[test]
    fn distance_filter_drops_far_candidates() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        // ~275mi away (Boston-ish from Philadelphia).
        let far = row("far", birth, &["hiking"], Some((42.36, -71.06)));
        let ranked = rank(&viewer(), &[far], today, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn unknown_distance_passes_the_filter() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let nowhere = row("nowhere", birth, &["coffee"], None);
        let ranked = rank(&viewer(), &[nowhere], today, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].distance, None);
    }

    #[test]
    fn age_range_preference_filters() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut v = viewer();
        v.age_range = Some((21, 30));
        let young = row("young", NaiveDate::from_ymd_opt(2008, 1, 2).unwrap(), &[], None);
        let ok = row("ok", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), &[], None);
        let ranked = rank(&v, &[young, ok], today, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "ok");
    }

    #[test]
    fn page_is_truncated_to_limit() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let birth = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let rows: Vec<_> = (0..15).map(|i| row(&format!("u{i}"), birth, &[], None)).collect();
        assert_eq!(rank(&viewer(), &rows, today, 10).len(), 10);
    }

    #[test]
    fn viewer_is_never_a_candidate() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let v = viewer();
        let mut p = personal("me", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        p.user_id = v.user_id;
        let prof = profile(p.user_id, &[], None, None);
        assert!(rank(&v, &[(p, prof)], today, 10).is_empty());
    }
}
