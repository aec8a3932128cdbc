use crate::domain::instrument::{Instrument, SentimentKeywords};
use crate::domain::round_to;
use crate::domain::signal::{NewsSentiment, SentimentLabel};
use crate::ingest::types::Article;

const OVERALL_THRESHOLD: f64 = 0.2;
pub const MAX_HEADLINES: usize = 3;

/// Keyword score of one text in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArticleScore {
    pub label: SentimentLabel,
    pub score: f64,
}

pub fn score_text(text: &str, keywords: &SentimentKeywords) -> ArticleScore {
    let text = text.to_lowercase();
    let count = |words: &[String]| {
        words
            .iter()
            .filter(|w| !w.trim().is_empty() && text.contains(&w.to_lowercase()))
            .count()
    };
    let pos = count(&keywords.positive);
    let neg = count(&keywords.negative);
    let total = (pos + neg) as f64;

    let (label, score) = match pos.cmp(&neg) {
        _ if pos + neg == 0 => (SentimentLabel::Neutral, 0.0),
        std::cmp::Ordering::Greater => (SentimentLabel::Positive, pos as f64 / total),
        std::cmp::Ordering::Less => (SentimentLabel::Negative, -(neg as f64) / total),
        std::cmp::Ordering::Equal => (SentimentLabel::Mixed, 0.0),
    };
    ArticleScore {
        label,
        score: round_to(score, 2),
    }
}

/// Articles mentioning the instrument, in input order.
pub fn company_articles<'a>(instrument: &Instrument, articles: &'a [Article]) -> Vec<&'a Article> {
    let keywords = instrument.news_keywords();
    articles
        .iter()
        .filter(|a| {
            let text = format!("{} {}", a.title, a.summary).to_lowercase();
            keywords.iter().any(|k| text.contains(k.as_str()))
        })
        .collect()
}

/// Aggregate sentiment plus the most recent matching headlines.
pub fn analyze(
    instrument: &Instrument,
    articles: &[Article],
    keywords: &SentimentKeywords,
) -> (NewsSentiment, Vec<String>) {
    let matched = company_articles(instrument, articles);
    if matched.is_empty() {
        return (NewsSentiment::no_data(&instrument.name), Vec::new());
    }

    let scores: Vec<ArticleScore> = matched
        .iter()
        .map(|a| score_text(&format!("{} {}", a.title, a.summary), keywords))
        .collect();
    let avg = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;

    let any_pos = scores.iter().any(|s| s.score > 0.0);
    let any_neg = scores.iter().any(|s| s.score < 0.0);
    let overall = if avg > OVERALL_THRESHOLD {
        SentimentLabel::Positive
    } else if avg < -OVERALL_THRESHOLD {
        SentimentLabel::Negative
    } else if any_pos && any_neg {
        SentimentLabel::Mixed
    } else {
        SentimentLabel::Neutral
    };

    let mut recent = matched.clone();
    recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    let headlines = recent
        .iter()
        .take(MAX_HEADLINES)
        .map(|a| a.title.clone())
        .collect();

    (
        NewsSentiment {
            company: instrument.name.clone(),
            article_count: matched.len(),
            overall,
            score: round_to(avg, 2),
        },
        headlines,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::Market;
    use chrono::{Duration, TimeZone, Utc};

    fn keywords() -> SentimentKeywords {
        SentimentKeywords {
            positive: vec!["beats".into(), "record".into(), "upgrade".into()],
            negative: vec!["miss".into(), "layoffs".into(), "downgrade".into()],
        }
    }

    fn volvo() -> Instrument {
        Instrument {
            symbol: "VOLV-B.ST".into(),
            name: "Volvo B".into(),
            market: Market::Home,
            cap_size: None,
        }
    }

    fn article(title: &str, hours_ago: i64) -> Article {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        Article {
            title: title.into(),
            summary: String::new(),
            link: String::new(),
            published_at: now - Duration::hours(hours_ago),
            source: "Wire".into(),
        }
    }

    #[test]
    fn scores_single_texts() {
        let k = keywords();
        assert_eq!(score_text("Record quarter, beats estimates", &k).score, 1.0);
        assert_eq!(
            score_text("Beats estimates despite layoffs and downgrade", &k),
            ArticleScore {
                label: SentimentLabel::Negative,
                score: -0.67
            }
        );
        assert_eq!(score_text("Upgrade after miss", &k).label, SentimentLabel::Mixed);
        assert_eq!(score_text("Annual meeting", &k).label, SentimentLabel::Neutral);
    }

    #[test]
    fn matches_first_word_and_symbol() {
        let articles = vec![
            article("Volvo posts record deliveries", 1),
            article("VOLV shares upgrade", 2),
            article("Ericsson layoffs", 3),
        ];
        assert_eq!(company_articles(&volvo(), &articles).len(), 2);
    }

    #[test]
    fn aggregates_positive_with_recent_headlines() {
        let articles = vec![
            article("Volvo beats forecast", 5),
            article("Volvo record orders", 1),
            article("Volvo annual meeting", 3),
            article("Volvo upgrade", 2),
        ];
        let (s, headlines) = analyze(&volvo(), &articles, &keywords());
        assert_eq!(s.article_count, 4);
        assert_eq!(s.overall, SentimentLabel::Positive);
        assert_eq!(s.score, 0.75);
        assert_eq!(
            headlines,
            vec!["Volvo record orders", "Volvo upgrade", "Volvo annual meeting"]
        );
    }

    #[test]
    fn disagreeing_articles_are_mixed() {
        let articles = vec![article("Volvo beats", 1), article("Volvo miss", 2)];
        let (s, _) = analyze(&volvo(), &articles, &keywords());
        assert_eq!(s.overall, SentimentLabel::Mixed);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn no_matches_is_no_data() {
        let (s, headlines) = analyze(&volvo(), &[article("Ericsson", 1)], &keywords());
        assert_eq!(s.overall, SentimentLabel::NoData);
        assert!(headlines.is_empty());
    }
}
