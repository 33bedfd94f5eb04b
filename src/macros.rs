macro_rules! model_use {
    () => {
        use ridley_api::errors::ChefError;
        use serde_json::Value;
        use std::collections::HashMap;
        use std::convert::TryFrom;
    };
}

/// A marker serialised as a fixed string, such as `json_class`.
macro_rules! chef_json_type {
    ($id:ident, $val:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct $id;

        impl Default for $id {
            fn default() -> $id {
                $id
            }
        }

        impl ::serde::Serialize for $id {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str($val)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $id {
            fn deserialize<D>(deserializer: D) -> Result<$id, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                if s == $val {
                    Ok($id)
                } else {
                    Err(::serde::de::Error::invalid_value(
                        ::serde::de::Unexpected::Str(&s),
                        &$val,
                    ))
                }
            }
        }
    };
}

macro_rules! model_impl {
    ($model:ident) => {
        impl TryFrom<Value> for $model {
            type Error = ChefError;

            fn try_from(json: Value) -> Result<$model, ChefError> {
                let model: $model = serde_json::from_value(json)?;
                model.validate()?;
                Ok(model)
            }
        }

        impl $model {
            pub fn to_json(&self) -> Result<Value, ChefError> {
                Ok(serde_json::to_value(self)?)
            }
        }
    };
}

/// The `{name: url}` index returned by a collection endpoint.
macro_rules! model_list {
    ($id:ident) => {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $id {
            items: Vec<String>,
        }

        impl $id {
            pub fn len(&self) -> usize {
                self.items.len()
            }

            pub fn is_empty(&self) -> bool {
                self.items.is_empty()
            }

            pub fn names(&self) -> &[String] {
                &self.items
            }
        }

        impl TryFrom<Value> for $id {
            type Error = ChefError;

            fn try_from(list: Value) -> Result<$id, ChefError> {
                let index: ::std::collections::BTreeMap<String, Value> =
                    serde_json::from_value(list)?;
                Ok($id {
                    items: index.into_iter().map(|(name, _)| name).collect(),
                })
            }
        }

        impl IntoIterator for $id {
            type Item = String;
            type IntoIter = ::std::vec::IntoIter<String>;

            fn into_iter(self) -> Self::IntoIter {
                self.items.into_iter()
            }
        }
    };
}
