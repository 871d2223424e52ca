//! End-to-end drill scenarios: leverage ordering, scheduling and matching together.

use std::collections::{HashMap, HashSet};

use mastery_core::{
    index_stats, prioritize, FuzzyMatcher, GlobalWordStat, Mode, SessionScheduler, Step, Word,
    WordId,
};
use pretty_assertions::assert_eq;

fn words(texts: &[&str]) -> Vec<Word> {
    texts.iter().map(|t| Word::new(t)).collect()
}

fn ids(texts: &[&str]) -> Vec<WordId> {
    texts.iter().map(|t| WordId::from(*t)).collect()
}

/// Three words, threshold 2, every answer correct.
#[test]
fn all_correct_masters_in_presentation_order() {
    let mut scheduler = SessionScheduler::seeded(17).with_shuffle(false);
    let first = scheduler
        .initialize(&words(&["cat", "dog", "sun"]), Mode::Mastery { threshold: 2 })
        .unwrap();
    assert_eq!(
        first,
        Step::Present {
            word: WordId::from("cat"),
            mastered: None
        }
    );

    let mut presented = Vec::new();
    let mut submissions = 0;
    let summary = loop {
        presented.push(scheduler.current_word().unwrap().clone());
        submissions += 1;
        if let Step::Complete(summary) = scheduler.submit_answer(true).unwrap() {
            break summary;
        }
    };

    assert_eq!(submissions, 6);
    assert_eq!(presented, ids(&["cat", "dog", "sun", "cat", "dog", "sun"]));
    assert_eq!(summary.mastered(), ids(&["cat", "dog", "sun"]).as_slice());
}

/// Two words, threshold 1, the first answer is a miss.
#[test]
fn missed_word_is_mastered_last() {
    let mut scheduler = SessionScheduler::seeded(3).with_shuffle(false);
    scheduler
        .initialize(&words(&["cat", "dog"]), Mode::Mastery { threshold: 1 })
        .unwrap();

    assert_eq!(scheduler.current_word(), Some(&WordId::from("cat")));
    let step = scheduler.submit_answer(false).unwrap();
    assert_eq!(
        step,
        Step::Present {
            word: WordId::from("dog"),
            mastered: None
        }
    );

    let step = scheduler.submit_answer(true).unwrap();
    assert_eq!(
        step,
        Step::Present {
            word: WordId::from("cat"),
            mastered: Some(WordId::from("dog"))
        }
    );

    match scheduler.submit_answer(true).unwrap() {
        Step::Complete(summary) => assert_eq!(summary.mastered(), ids(&["dog", "cat"]).as_slice()),
        other => panic!("expected completion, got {other:?}"),
    }
}

/// Same miss scenario with a shuffled deck: whichever word comes first is missed.
#[test]
fn missed_word_is_mastered_last_with_shuffle() {
    for seed in 0..20 {
        let mut scheduler = SessionScheduler::seeded(seed);
        scheduler
            .initialize(&words(&["cat", "dog"]), Mode::Mastery { threshold: 1 })
            .unwrap();
        let missed = scheduler.current_word().unwrap().clone();

        scheduler.submit_answer(false).unwrap();
        scheduler.submit_answer(true).unwrap();
        let Step::Complete(summary) = scheduler.submit_answer(true).unwrap() else {
            panic!("session should be complete after three answers");
        };
        assert_eq!(summary.mastered().last(), Some(&missed));
    }
}

/// Voice-mode drill: verdicts come from the matcher instead of a button.
#[test]
fn matcher_verdicts_drive_the_scheduler() {
    let matcher = FuzzyMatcher::default();
    let mut scheduler = SessionScheduler::seeded(8).with_shuffle(false);
    scheduler
        .initialize(&words(&["there", "elephant"]), Mode::Mastery { threshold: 1 })
        .unwrap();

    let heard = ["their!", "elefan", "elefant"];
    let mut summary = None;
    for transcript in heard {
        let target = scheduler.current_word().unwrap().clone();
        let correct = matcher.is_match(transcript, target.as_str());
        if let Step::Complete(done) = scheduler.submit_answer(correct).unwrap() {
            summary = Some(done);
        }
    }

    let summary = summary.expect("session completes");
    assert_eq!(summary.mastered(), ids(&["there", "elephant"]).as_slice());
}

/// Leverage ordering feeds an unshuffled session.
#[test]
fn leverage_order_becomes_presentation_order() {
    let stats: HashMap<String, GlobalWordStat> = index_stats(vec![
        GlobalWordStat::new("the", 40, 900),
        GlobalWordStat::new("dragon", 1, 120),
        GlobalWordStat::new("said", 25, 200),
    ]);
    let book: HashSet<String> = ["the", "dragon", "said", "flew"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    let mastered: HashSet<String> = HashSet::from(["the".to_string()]);

    let ordered = prioritize(&book, &mastered, &stats);
    assert_eq!(ordered, vec!["said", "dragon", "flew"]);

    let deck: Vec<Word> = ordered.iter().map(|w| Word::new(w)).collect();
    let mut scheduler = SessionScheduler::seeded(1).with_shuffle(false);
    scheduler.initialize(&deck, Mode::History).unwrap();
    let queue: Vec<&WordId> = scheduler.queue().collect();
    assert_eq!(queue, ids(&["said", "dragon", "flew"]).iter().collect::<Vec<_>>());
}
