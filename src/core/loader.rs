use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    convert::{TryFrom, TryInto},
    fmt,
    path::PathBuf,
};

/// Where a parameter set came from, for diagnostics only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileLoc {
    pub filename: String,
    /// Position of the entry inside its json array.
    pub index: Option<usize>,
}

impl FileLoc {
    pub fn new<S: Into<String>>(filename: S, index: Option<usize>) -> Self {
        Self {
            filename: filename.into(),
            index,
        }
    }
}

impl fmt::Display for FileLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.filename, index),
            None => write!(f, "{}", self.filename),
        }
    }
}

/// Named parameters of one scene object. Keys are marked as used when read, so leftovers can
/// be reported.
#[derive(Debug, Default)]
pub struct InputParams {
    params: HashMap<String, InputParamsValue>,
    name: Cow<'static, str>,
    visited_names: HashSet<String>,
    base_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputParamsValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Array(Vec<InputParamsValue>),
}

impl InputParamsValue {
    fn as_int(&self) -> Option<i32> {
        match self {
            InputParamsValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f32> {
        match self {
            InputParamsValue::Float(value) => Some(*value),
            InputParamsValue::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            InputParamsValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

macro_rules! params_get {
    ( $( ( $name:ident, $type:ty, $convert:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<get_ $name>](&mut self, key: &str) -> anyhow::Result<$type> {
                    if let Some(value) = self.params.get(key) {
                        if let Some(value) = value.$convert() {
                            self.visited_names.insert(key.to_owned());
                            return Ok(value);
                        }
                        anyhow::bail!(format!("{} - '{}' should be {}", self.name, key, $hint));
                    }
                    anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
                }

                pub fn [<get_ $name _or>](&mut self, key: &str, fallback: $type) -> anyhow::Result<$type> {
                    if self.params.contains_key(key) {
                        self.[<get_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

macro_rules! params_get_vec {
    ( $( ( $name:ident, $elem:ident, $type:ty, $len:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<get_ $name>](&mut self, key: &str) -> anyhow::Result<[$type; $len]> {
                    let arr = self.[<get_ $elem _array>](key, Some($len))?;
                    let mut result = [<$type>::default(); $len];
                    result.copy_from_slice(&arr);
                    Ok(result)
                }

                pub fn [<get_ $name _or>](
                    &mut self,
                    key: &str,
                    fallback: [$type; $len],
                ) -> anyhow::Result<[$type; $len]> {
                    if self.params.contains_key(key) {
                        self.[<get_ $name>](key)
                    } else {
                        Ok(fallback)
                    }
                }
            }
        )+
    };
}

macro_rules! params_get_array {
    ( $( ( $name:ident, $type:ty, $convert:ident, $hint:expr ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                pub fn [<get_ $name _array>](
                    &mut self,
                    key: &str,
                    len: Option<usize>,
                ) -> anyhow::Result<Vec<$type>> {
                    if let Some(value) = self.params.get(key) {
                        let error_info = if let Some(len) = len {
                            format!(
                                "{} - '{}' should be array with {} {}s",
                                self.name,
                                key,
                                len,
                                $hint,
                            )
                        } else {
                            format!("{} - '{}' should be array of {}", self.name, key, $hint)
                        };
                        if let InputParamsValue::Array(arr) = value {
                            if let Some(len) = len {
                                if arr.len() != len {
                                    anyhow::bail!(error_info);
                                }
                            }
                            let mut result = Vec::with_capacity(arr.len());
                            for ele in arr {
                                match ele.$convert() {
                                    Some(ele) => result.push(ele),
                                    None => anyhow::bail!(error_info),
                                }
                            }
                            self.visited_names.insert(key.to_owned());
                            return Ok(result);
                        }
                        anyhow::bail!(error_info);
                    }
                    anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
                }
            }
        )+
    };
}

impl InputParams {
    pub fn new<S: Into<Cow<'static, str>>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with<V: Into<InputParamsValue>>(mut self, key: &str, value: V) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    pub fn set_name(&mut self, name: Cow<'static, str>) {
        self.name = name;
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn set_base_path(&mut self, path: PathBuf) {
        self.base_path = path;
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_str(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(InputParamsValue::String(_)))
    }

    params_get! {
        (int, i32, as_int, "integer"),
        (float, f32, as_float, "float"),
        (bool, bool, as_bool, "boolean"),
    }

    params_get_array! {
        (int, i32, as_int, "integer"),
        (float, f32, as_float, "float"),
    }

    params_get_vec! {
        (int2, int, i32, 2),
        (float3, float, f32, 3),
    }

    pub fn get_matrix(&mut self, key: &str) -> anyhow::Result<glam::Mat4> {
        let arr = self.get_float_array(key, Some(16))?;
        // column-major, as glam stores it
        Ok(glam::Mat4::from_cols_slice(&arr))
    }

    pub fn get_str(&mut self, key: &str) -> anyhow::Result<String> {
        if let Some(value) = self.params.get(key) {
            if let InputParamsValue::String(value) = value {
                self.visited_names.insert(key.to_owned());
                return Ok(value.clone());
            }
            anyhow::bail!(format!("{} - '{}' should be string", self.name, key));
        }
        anyhow::bail!(format!("{} - there is no '{}' field", self.name, key));
    }

    pub fn get_str_or(&mut self, key: &str, fallback: &str) -> anyhow::Result<String> {
        if self.params.contains_key(key) {
            self.get_str(key)
        } else {
            Ok(fallback.to_owned())
        }
    }

    pub fn get_file_path(&mut self, key: &str) -> anyhow::Result<PathBuf> {
        let filename = self.get_str(key)?;
        let path = self.base_path.with_file_name(filename);
        Ok(path)
    }

    pub fn num_unused_keys(&self) -> usize {
        self.params
            .keys()
            .filter(|k| !k.starts_with('#') && !self.visited_names.contains(*k))
            .count()
    }

    pub fn check_unused_keys(&self) {
        for k in self.params.keys() {
            if !k.starts_with('#') && !self.visited_names.contains(k) {
                log::warn!("{} - unused key '{}'", self.name, k);
            }
        }
    }
}

impl From<i32> for InputParamsValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for InputParamsValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for InputParamsValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for InputParamsValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T: Into<InputParamsValue>> From<Vec<T>> for InputParamsValue {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<&serde_json::Value> for InputParamsValue {
    type Error = anyhow::Error;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => {
                anyhow::bail!("can't convert to InputParamsValue from null json")
            }
            serde_json::Value::Bool(v) => Ok(Self::Bool(*v)),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    Ok(Self::Int(v as i32))
                } else if let Some(v) = v.as_f64() {
                    Ok(Self::Float(v as f32))
                } else {
                    anyhow::bail!("can't convert number '{}'", v)
                }
            }
            serde_json::Value::String(v) => Ok(Self::String(v.clone())),
            serde_json::Value::Array(arr) => {
                let mut values = Vec::<InputParamsValue>::with_capacity(arr.len());
                for v in arr {
                    match v.try_into() {
                        Ok(v) => values.push(v),
                        Err(e) => anyhow::bail!(format!("can't convert array element: {}", e)),
                    }
                }
                Ok(Self::Array(values))
            }
            serde_json::Value::Object(_) => {
                anyhow::bail!("can't convert to InputParamsValue from object json")
            }
        }
    }
}

impl TryFrom<&serde_json::Value> for InputParams {
    type Error = anyhow::Error;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        if let serde_json::Value::Object(value) = value {
            let mut params = HashMap::<String, InputParamsValue>::with_capacity(value.len());
            for (k, v) in value {
                match v.try_into() {
                    Ok(v) => {
                        params.insert(k.clone(), v);
                    }
                    Err(e) => anyhow::bail!(format!("can't convert member '{}': {}", k, e)),
                }
            }
            Ok(Self {
                params,
                ..Default::default()
            })
        } else {
            anyhow::bail!("can't convert to InputParams from non-object json value");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_mark_keys() {
        let json = serde_json::json!({
            "radius": 2,
            "jitter": false,
            "P": [0, 0, 0, 1.5, 0, 0],
            "indices": [0, 1, 2],
            "name": "ball",
            "unused": 1.0,
        });
        let mut params = InputParams::try_from(&json).unwrap();
        params.set_name("shape-sphere".into());

        assert_eq!(params.get_float("radius").unwrap(), 2.0);
        assert!(params.get_int("radius").is_ok());
        assert_eq!(params.get_bool("jitter").unwrap(), false);
        assert_eq!(params.get_float_array("P", None).unwrap()[3], 1.5);
        assert_eq!(params.get_int_array("indices", Some(3)).unwrap(), vec![0, 1, 2]);
        assert!(params.get_int_array("indices", Some(4)).is_err());
        assert_eq!(params.get_str("name").unwrap(), "ball");
        assert_eq!(params.num_unused_keys(), 1);
    }

    #[test]
    fn fallbacks_and_errors() {
        let mut params = InputParams::new("sampler-stratified")
            .with("xsamples", 4)
            .with("seed", "zero");
        assert_eq!(params.get_int_or("ysamples", 2).unwrap(), 2);
        assert_eq!(params.get_int_or("xsamples", 2).unwrap(), 4);

        let err = params.get_int_or("seed", 0).unwrap_err().to_string();
        assert!(err.starts_with("sampler-stratified - 'seed' should be integer"));
        let err = params.get_float("missing").unwrap_err().to_string();
        assert!(err.contains("there is no 'missing' field"));
    }

    #[test]
    fn matrix_and_vectors() {
        let mut params = InputParams::new("shape")
            .with("translate", vec![1.0f32, 2.0, 3.0])
            .with(
                "matrix",
                vec![
                    1.0f32, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 4.0, 5.0,
                    6.0, 1.0,
                ],
            );
        assert_eq!(params.get_float3("translate").unwrap(), [1.0, 2.0, 3.0]);
        let m = params.get_matrix("matrix").unwrap();
        assert_eq!(m.w_axis, glam::Vec4::new(4.0, 5.0, 6.0, 1.0));
        assert!(params.get_int2("translate").is_err());
    }

    #[test]
    fn file_loc_display() {
        assert_eq!(FileLoc::new("scene.json", Some(2)).to_string(), "scene.json[2]");
        assert_eq!(FileLoc::new("scene.json", None).to_string(), "scene.json");
    }
}
