//! Stopword tables.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Korean function words and light verbs dropped from token sequences.
pub const KOREAN_STOPWORDS: &[&str] = &[
    "그리고", "그러나", "하지만", "또한", "이것", "저것", "그것", "저희", "우리", "너희", "당신",
    "에서", "으로", "에게", "한다", "했다", "하는", "있다", "없다", "것", "수", "등",
];

/// English stopwords (the NLTK `english` list).
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

static KOREAN_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| KOREAN_STOPWORDS.iter().copied().collect());

static ENGLISH_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

/// Returns true if `word` is a Korean stopword.
pub fn is_korean_stopword(word: &str) -> bool {
    KOREAN_SET.contains(word)
}

/// Returns true if `word` (lowercase) is an English stopword.
pub fn is_english_stopword(word: &str) -> bool {
    ENGLISH_SET.contains(word)
}
