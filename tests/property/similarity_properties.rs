use evidence_search::corpus::Corpus;
use evidence_search::language::RuleBasedModel;
use evidence_search::models::CorpusRecord;
use evidence_search::normalize::Normalizer;
use evidence_search::query::{assemble, dedup_rows, rank, SearchQuery, TitleSearchEngine};
use proptest::prelude::*;

const EPSILON: f64 = 1e-9;

fn title_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{2,8}", 1..6).prop_map(|words| words.join(" "))
}

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(title_strategy(), 1..12)
}

fn record_strategy() -> impl Strategy<Value = CorpusRecord> {
    (
        prop::sample::select(vec!["knee pain", "low back pain", "ankle sprain"]),
        prop::sample::select(vec!["OA Joelho", "Lombalgia"]),
        prop::option::of(0u8..=10),
    )
        .prop_map(|(title, region, quality)| CorpusRecord {
            title: title.to_string(),
            normalized_title: title.to_string(),
            region: region.to_string(),
            quality_score: quality,
            study_type: "Ensaio clínico".to_string(),
            year: None,
        })
}

fn record(title: &str, quality: u8) -> CorpusRecord {
    CorpusRecord {
        title: title.to_string(),
        normalized_title: String::new(),
        region: "OA Joelho".to_string(),
        quality_score: Some(quality),
        study_type: "Ensaio clínico".to_string(),
        year: None,
    }
}

proptest! {
    #[test]
    fn scores_align_with_corpus_and_stay_in_unit_range(query in title_strategy(), titles in corpus_strategy()) {
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let scores = rank(&query, &refs, 1, 1).unwrap();
        prop_assert_eq!(scores.len(), titles.len());
        for score in scores {
            prop_assert!((0.0..=1.0).contains(&score), "score out of range: {}", score);
        }
    }

    #[test]
    fn title_is_maximally_similar_to_itself(titles in corpus_strategy(), pick in any::<prop::sample::Index>()) {
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let i = pick.index(refs.len());
        let scores = rank(refs[i], &refs, 1, 1).unwrap();
        prop_assert!((scores[i] - 1.0).abs() < EPSILON, "self similarity {}", scores[i]);
    }

    #[test]
    fn corpus_order_does_not_change_scores(query in title_strategy(), titles in corpus_strategy()) {
        let forward: Vec<&str> = titles.iter().map(String::as_str).collect();
        let reversed: Vec<&str> = forward.iter().rev().copied().collect();

        let a = rank(&query, &forward, 1, 2).unwrap();
        let mut b = rank(&query, &reversed, 1, 2).unwrap();
        b.reverse();

        for (x, y) in a.iter().zip(&b) {
            prop_assert!((x - y).abs() < EPSILON, "{} != {}", x, y);
        }
    }

    #[test]
    fn empty_query_scores_zero(titles in corpus_strategy()) {
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let scores = rank("", &refs, 1, 1).unwrap();
        prop_assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn assembled_rows_are_bounded_ordered_and_unique(
        records in prop::collection::vec(record_strategy(), 1..15),
        top_k in 0usize..30,
        seed in any::<u64>(),
    ) {
        let similarities: Vec<f64> = (0..records.len())
            .map(|i| ((seed.wrapping_add(i as u64 * 7919)) % 100) as f64 / 100.0)
            .collect();
        let rows = assemble(&records, &similarities, top_k);

        prop_assert!(!rows.is_empty());
        prop_assert!(rows.len() <= top_k.clamp(1, records.len()));
        for pair in rows.windows(2) {
            prop_assert!(pair[0].quality_score >= pair[1].quality_score);
        }

        let again = dedup_rows(rows.clone());
        prop_assert_eq!(again, rows);
    }
}

#[test]
fn knee_pain_query_prefers_matching_titles_by_quality() {
    let records = vec![
        record("Knee pain exercise", 8),
        record("Low back pain", 5),
        record("Knee pain and exercise therapy", 6),
    ];
    let corpus = Corpus::new(prepare(records)).unwrap();
    let engine = TitleSearchEngine::new(Normalizer::new(RuleBasedModel::english()), corpus);

    let rows = engine
        .search(&SearchQuery::new("knee pain".to_string(), Some(2), None))
        .unwrap();

    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Knee pain exercise", "Knee pain and exercise therapy"]);
    assert_eq!(rows[0].quality_tier.label(), "HIGH");
    assert_eq!(rows[1].quality_tier.label(), "LOW");
}

#[test]
fn oversized_top_k_returns_whole_corpus() {
    let records: Vec<CorpusRecord> = ["hip fracture rehab", "shoulder pain", "neck pain", "ankle sprain", "knee brace"]
        .iter()
        .enumerate()
        .map(|(i, title)| record(title, i as u8))
        .collect();
    let corpus = Corpus::new(prepare(records)).unwrap();
    let engine = TitleSearchEngine::new(Normalizer::new(RuleBasedModel::english()), corpus);

    let rows = engine
        .search(&SearchQuery::new("pain".to_string(), Some(50), None))
        .unwrap();
    assert_eq!(rows.len(), 5);
    let qualities: Vec<u8> = rows.iter().map(|r| r.quality_score).collect();
    assert_eq!(qualities, vec![4, 3, 2, 1, 0]);
}

fn prepare(records: Vec<CorpusRecord>) -> Vec<CorpusRecord> {
    let normalizer = Normalizer::new(RuleBasedModel::english());
    let (prepared, _) =
        evidence_search::corpus::prepare::prepare_records(&normalizer, records, true, |_| {}).unwrap();
    prepared
}
