use indexmap::IndexMap;
use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_reduction::Pca;
use ndarray::Array2;
use tracing::info;

use crate::constants::aggregation::{PCA_DEDUP_DECIMALS, PCA_DEFAULT_COMPONENTS};
use crate::data::{Record, RecordBuffer, Value};
use crate::errors::{PipeError, Result};
use crate::types::Vector;
use crate::utils::{cosine_distance, difference, l1_norm, l2_norm, rounded_key};

/// Which features [`pca_combine_embeddings`] concatenates.
///
/// Output order is fixed: cosine distance, L1 distance, L2 distance, first
/// vector, second vector, difference, then the PCA projections of the first
/// vector, the second vector, and their difference.
#[derive(Clone, Debug, PartialEq)]
pub struct CombineFeatures {
    /// `1 - cos(first, second)`.
    pub cosine: bool,
    /// L1 norm of `first - second`.
    pub l1: bool,
    /// L2 norm of `first - second`.
    pub l2: bool,
    /// The first vector as-is.
    pub first: bool,
    /// The second vector as-is.
    pub second: bool,
    /// `first - second`.
    pub difference: bool,
    /// PCA projection of the first vector.
    pub pca_first: bool,
    /// PCA projection of the second vector.
    pub pca_second: bool,
    /// `pca(first) - pca(second)`.
    pub pca_difference: bool,
    /// Number of principal components kept.
    pub pca_components: usize,
}

impl Default for CombineFeatures {
    fn default() -> Self {
        Self {
            cosine: true,
            l1: true,
            l2: true,
            first: false,
            second: false,
            difference: false,
            pca_first: false,
            pca_second: false,
            pca_difference: false,
            pca_components: PCA_DEFAULT_COMPONENTS,
        }
    }
}

impl CombineFeatures {
    /// No features; enable the ones you need with the `with_*` builders.
    pub fn none() -> Self {
        Self {
            cosine: false,
            l1: false,
            l2: false,
            ..Self::default()
        }
    }

    /// Toggle the scalar distances (cosine, L1, L2).
    pub fn with_distances(mut self, enabled: bool) -> Self {
        self.cosine = enabled;
        self.l1 = enabled;
        self.l2 = enabled;
        self
    }

    /// Toggle the raw first/second/difference vectors.
    pub fn with_raw(mut self, first: bool, second: bool, difference: bool) -> Self {
        self.first = first;
        self.second = second;
        self.difference = difference;
        self
    }

    /// Toggle the PCA-projected first/second/difference vectors.
    pub fn with_pca(mut self, first: bool, second: bool, difference: bool) -> Self {
        self.pca_first = first;
        self.pca_second = second;
        self.pca_difference = difference;
        self
    }

    /// Set the number of principal components.
    pub fn with_pca_components(mut self, components: usize) -> Self {
        self.pca_components = components;
        self
    }

    fn uses_pca(&self) -> bool {
        self.pca_first || self.pca_second || self.pca_difference
    }
}

/// Concatenate distance, raw, and PCA features of two vector attributes into `dest_attr`.
///
/// Materializes. When any PCA feature is requested, a PCA transform is fit
/// over every distinct vector seen in either attribute; vectors are
/// deduplicated by their 4-decimal rounding, so near-identical vectors count
/// once. Records missing either attribute pass through. A value that is not
/// a numeric vector, or a dimension mismatch, fails with `SchemaViolation`.
pub fn pca_combine_embeddings(
    buffer: RecordBuffer,
    first_attr: &str,
    second_attr: &str,
    dest_attr: &str,
    features: &CombineFeatures,
) -> Result<RecordBuffer> {
    let mut dimension: Option<usize> = None;
    let mut pairs: Vec<Option<(Vector, Vector)>> = Vec::with_capacity(buffer.len());
    for record in &buffer {
        let (Some(first), Some(second)) = (record.get(first_attr), record.get(second_attr)) else {
            pairs.push(None);
            continue;
        };
        let first = numeric_vector(first_attr, first, &mut dimension)?;
        let second = numeric_vector(second_attr, second, &mut dimension)?;
        pairs.push(Some((first, second)));
    }

    let projection = if features.uses_pca() {
        Some(fit_projection(
            pairs.iter().flatten().flat_map(|(first, second)| [first, second]),
            dimension.unwrap_or(0),
            features.pca_components,
        )?)
    } else {
        None
    };

    buffer
        .into_iter()
        .zip(pairs)
        .map(|(mut record, pair)| {
            if let Some((first, second)) = pair {
                let combined = combine(&first, &second, features, projection.as_ref())?;
                record.insert(dest_attr, Value::Vector(combined));
            }
            Ok(record)
        })
        .collect::<Result<Vec<Record>>>()
        .map(RecordBuffer::from)
}

fn numeric_vector(attr: &str, value: &Value, dimension: &mut Option<usize>) -> Result<Vector> {
    let vector = value
        .to_vector()
        .ok_or_else(|| PipeError::schema(attr, "value is not a numeric vector"))?;
    match dimension {
        Some(expected) if *expected != vector.len() => Err(PipeError::schema(
            attr,
            format!("expected dimension {expected}, found {}", vector.len()),
        )),
        Some(_) => Ok(vector),
        None => {
            *dimension = Some(vector.len());
            Ok(vector)
        }
    }
}

fn fit_projection<'a>(
    vectors: impl Iterator<Item = &'a Vector>,
    dimension: usize,
    components: usize,
) -> Result<Pca<f64>> {
    let mut distinct: IndexMap<String, &Vector> = IndexMap::new();
    for vector in vectors {
        distinct
            .entry(rounded_key(vector, PCA_DEDUP_DECIMALS))
            .or_insert(vector);
    }
    if components == 0 || components > dimension || distinct.len() < 2 {
        return Err(PipeError::Configuration(format!(
            "cannot fit {components} principal components on {} distinct vectors of dimension {dimension}",
            distinct.len()
        )));
    }
    info!(
        vectors = distinct.len(),
        dimension,
        components,
        "[datautils:aggregate] fitting PCA"
    );
    let flat: Vec<f64> = distinct.values().flat_map(|vector| vector.iter().copied()).collect();
    let matrix = Array2::from_shape_vec((distinct.len(), dimension), flat)
        .map_err(|err| PipeError::Configuration(err.to_string()))?;
    Ok(Pca::params(components).fit(&DatasetBase::from(matrix))?)
}

fn project(pca: &Pca<f64>, vector: &Vector) -> Result<Vector> {
    let row = Array2::from_shape_vec((1, vector.len()), vector.clone())
        .map_err(|err| PipeError::Configuration(err.to_string()))?;
    let projected: Array2<f64> = pca.predict(&row);
    Ok(projected.iter().copied().collect())
}

fn combine(
    first: &Vector,
    second: &Vector,
    features: &CombineFeatures,
    projection: Option<&Pca<f64>>,
) -> Result<Vector> {
    let diff = difference(first, second);
    let mut out = Vector::new();
    if features.cosine {
        out.push(cosine_distance(first, second));
    }
    if features.l1 {
        out.push(l1_norm(&diff));
    }
    if features.l2 {
        out.push(l2_norm(&diff));
    }
    if features.first {
        out.extend_from_slice(first);
    }
    if features.second {
        out.extend_from_slice(second);
    }
    if features.difference {
        out.extend_from_slice(&diff);
    }
    if let Some(pca) = projection {
        let first = project(pca, first)?;
        let second = project(pca, second)?;
        if features.pca_first {
            out.extend_from_slice(&first);
        }
        if features.pca_second {
            out.extend_from_slice(&second);
        }
        if features.pca_difference {
            out.extend(difference(&first, &second));
        }
    }
    Ok(out)
}
