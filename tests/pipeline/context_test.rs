//! Region and category tagging.

use trendscope::extractors::context::{ContextTagger, KeywordRule};
use trendscope::types::{Category, Region};

fn tag(text: &str) -> (Option<Region>, Option<Category>) {
    let tags = ContextTagger::new().tag(text);
    (tags.region, tags.category)
}

#[test]
fn country_codes_inside_words_do_not_match() {
    // "crusader" contains "de", "us" and "usa".
    assert_eq!(tag("warframe vs crusader kings"), (None, None));
    assert_eq!(tag("any deals today"), (None, None));
    assert_eq!(tag("free play in the ukraine queue"), (None, None));
    assert_eq!(tag("atv stats"), (None, None));
}

#[test]
fn country_code_as_a_word_matches() {
    assert_eq!(
        tag("top anime in the us"),
        (Some(Region::UnitedStates), Some(Category::MangaAnime))
    );
    assert_eq!(
        tag("trending games in de"),
        (Some(Region::Germany), Some(Category::Games))
    );
}

#[test]
fn names_match_as_substrings() {
    assert_eq!(
        tag("german tv shows"),
        (Some(Region::Germany), Some(Category::TvSeries))
    );
    assert_eq!(tag("video game trends").1, Some(Category::Games));
}

#[test]
fn first_declared_rule_wins() {
    // Germany is declared before France.
    assert_eq!(
        tag("french and german films"),
        (Some(Region::Germany), Some(Category::Movies))
    );
}

#[test]
fn custom_tables_replace_defaults() {
    let tagger = ContextTagger::with_tables(
        vec![KeywordRule::substring("warsaw", Region::Poland)],
        vec![KeywordRule::token("ova", Category::MangaAnime)],
    );
    let tags = tagger.tag("new ova releases in warsaw");
    assert_eq!(tags.region, Some(Region::Poland));
    assert_eq!(tags.category, Some(Category::MangaAnime));

    let tags = tagger.tag("nova in germany");
    assert_eq!(tags.region, None);
    assert_eq!(tags.category, None);
}
