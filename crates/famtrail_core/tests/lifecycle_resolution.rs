use famtrail_core::{resolve, LifecycleKeywords, LifecycleResolver, LocationEntry, PersonTimeline};
use famtrail_core::timeline::keywords::LifecycleClassifier;

fn timeline(person: &str, rows: &[(i32, &str)]) -> PersonTimeline {
    PersonTimeline::new(
        person,
        rows.iter().enumerate().map(|(index, (year, info))| {
            LocationEntry::new(person, *year, 48.8566, 2.3522)
                .with_place(format!("place-{year}"))
                .with_info(*info)
                .with_input_index(index)
        }),
    )
}

#[test]
fn person_a_stop_example() {
    let a = timeline("A", &[(2000, ""), (2010, "stop"), (2015, "")]);

    let at_2005 = resolve(&a, 2005).expect("A should be visible in 2005");
    assert_eq!(at_2005.year, 2000);
    assert!(resolve(&a, 2010).is_none());
    assert!(resolve(&a, 2020).is_none());
}

#[test]
fn person_b_final_example() {
    let b = timeline("B", &[(1990, ""), (2005, "décès")]);

    assert_eq!(resolve(&b, 2005).expect("final year is shown").year, 2005);
    assert!(resolve(&b, 2006).is_none());
    assert_eq!(resolve(&b, 2000).expect("before final event").year, 1990);
}

#[test]
fn without_markers_latest_entry_at_or_before_target_wins() {
    let person = timeline("C", &[(1950, ""), (1962, ""), (1975, ""), (1990, "")]);

    for target in 1950..=2000 {
        let expected = [1950, 1962, 1975, 1990]
            .into_iter()
            .filter(|year| *year <= target)
            .max();
        let actual = resolve(&person, target).map(|position| position.year);
        assert_eq!(actual, expected, "target year {target}");
    }
}

#[test]
fn no_entries_before_target_is_absent() {
    let person = timeline("D", &[(1950, "")]);
    assert!(resolve(&person, 1949).is_none());
    assert!(resolve(&PersonTimeline::new("E", Vec::new()), 2000).is_none());
}

#[test]
fn stop_suppresses_every_later_target() {
    let person = timeline("F", &[(1900, ""), (1920, "Stop"), (1921, ""), (1950, "")]);
    for target in 1920..=2000 {
        assert!(resolve(&person, target).is_none(), "target year {target}");
    }
    assert_eq!(resolve(&person, 1919).map(|position| position.year), Some(1900));
}

#[test]
fn stop_then_ordinary_then_later_query_is_absent() {
    let person = timeline("G", &[(2000, "stop"), (2001, "")]);
    assert!(resolve(&person, 2002).is_none());
}

#[test]
fn final_event_only_entry_is_shown_in_its_year() {
    let person = timeline("H", &[(1944, "Divorced")]);
    let resolved = resolve(&person, 1944).expect("final entry is displayed in its own year");
    assert_eq!(resolved.info, "Divorced");
    assert!(resolve(&person, 1945).is_none());
    assert!(resolve(&person, 1943).is_none());
}

#[test]
fn final_event_is_ignored_before_it_happens() {
    let person = timeline("I", &[(1900, ""), (1910, ""), (1930, "deceased")]);
    assert_eq!(resolve(&person, 1929).map(|position| position.year), Some(1910));
}

#[test]
fn resolved_position_carries_entry_fields() {
    let person = timeline("J", &[(1900, "naissance")]);
    let resolved = resolve(&person, 1950).unwrap();
    assert_eq!(resolved.person, "J");
    assert_eq!(resolved.place, "place-1900");
    assert_eq!(resolved.info, "naissance");
    assert_eq!(resolved.lat, 48.8566);
    assert_eq!(resolved.lon, 2.3522);
}

#[test]
fn custom_keywords_drive_classification() {
    let keywords = LifecycleKeywords {
        stop: vec!["perdu de vue".to_string()],
        deceased: vec!["inhumé".to_string()],
        divorce: Vec::new(),
    };
    let classifier = LifecycleClassifier::new(&keywords).unwrap();
    let resolver = LifecycleResolver::new(&classifier);

    let lost = timeline("K", &[(1900, ""), (1910, "Perdu de vue")]);
    assert!(resolver.resolve(&lost, 1911).is_none());

    let buried = timeline("L", &[(1900, ""), (1910, "INHUMÉ à Nantes")]);
    assert_eq!(resolver.resolve(&buried, 1910).unwrap().year, 1910);
    assert!(resolver.resolve(&buried, 1911).is_none());

    // Default words are not active with a custom list.
    let plain_stop = timeline("M", &[(1900, ""), (1910, "stop")]);
    assert_eq!(resolver.resolve(&plain_stop, 1911).unwrap().year, 1910);
}
