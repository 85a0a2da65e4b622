/// Default attribute names shared by sources, pipes, and combos.
pub mod attrs {
    /// Attribute holding document text (or tokens/vectors after transformation).
    pub const DATA: &str = "data";
    /// Attribute holding the source document id / relative path.
    pub const SOURCE: &str = "source";
    /// Attribute holding a class label.
    pub const LABEL: &str = "label";
    /// Attribute holding a document path in JSON annotation streams.
    pub const DATAPATH: &str = "datapath";
    /// Attribute holding an annotation value.
    pub const ANNOTATION: &str = "annotation";
    /// Attribute flagging whether a label is observed in JSON annotation streams.
    pub const LABEL_OBSERVED: &str = "labelobserved";
    /// Attributes used to collapse JSON annotation streams to one record per document.
    pub const JSON_GROUP_BY: [&str; 4] = [SOURCE, DATAPATH, LABEL, LABEL_OBSERVED];
}

/// Constants used by text and token pipes.
pub mod text {
    /// Default tokenization regex (splits on runs of non-letters).
    pub const TOKEN_SPLIT_REGEX: &str = "[^a-zA-Z]+";
    /// Default blank-line delimiter that ends an email header.
    pub const EMAIL_HEADER_REGEX: &str = "\n\n|\r\r|\n\r\n\r";
    /// Literal alternatives of [`EMAIL_HEADER_REGEX`].
    pub const EMAIL_HEADER_DELIMITERS: [&str; 3] = ["\n\n", "\r\r", "\n\r\n\r"];
    /// Default timestamp layout used by annotation exports.
    pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
    /// Separator used when numbering split attributes (`data` -> `data_0`).
    pub const SPLIT_ATTR_SEPARATOR: &str = "_";
    /// Stop words bundled with the crate (one per line).
    pub const DEFAULT_STOPWORDS: &str = include_str!("../resources/stopwords.txt");
}

/// Constants used by two-pass aggregation pipes.
pub mod aggregation {
    /// Minimum number of votes before a majority label is attached.
    pub const MAJORITY_MIN_COUNT: usize = 3;
    /// Decimal digits kept when deduplicating vectors before PCA fitting.
    pub const PCA_DEDUP_DECIMALS: usize = 4;
    /// Principal components kept when PCA features are requested.
    pub const PCA_DEFAULT_COMPONENTS: usize = 2;
}

/// Constants used by the fixed pipeline combos.
pub mod combos {
    /// Shortest token kept by the sentence combos (drops empty strings).
    pub const SENTENCE_MIN_TOKEN_LEN: usize = 1;
    /// Shortest token kept by the bag-of-words combo.
    pub const BOW_MIN_TOKEN_LEN: usize = 3;
    /// Minimum corpus-wide token count kept by the bag-of-words combo.
    pub const BOW_MIN_COUNT: usize = 6;
    /// Documents between progress log lines while walking index files.
    pub const PROGRESS_EVERY: usize = 100;
}

/// Constants used by vector-model glue and dataset output.
pub mod vectors {
    /// Word delimiter used when averaging word vectors over text.
    pub const WORD_DELIMITER: &str = " ";
    /// Prefix applied to document ids when used as vector-model keys.
    pub const DOC_LABEL_PREFIX: &str = "src=";
    /// Default embedding dimension for CLI-driven vectorization.
    pub const DEFAULT_DIMENSION: usize = 100;
}
