use crate::{Element, Error, Path, Result};
use duplicate::duplicate_item;
use serde_json::Value;

pub trait FieldpathExt: Sized {
    fn get_comp(&self, comp: &Element) -> Result<&Self>;
    fn get_path(&self, path: &Path) -> Result<&Self>;

    fn get_comp_mut(&mut self, comp: &Element) -> Result<&mut Self>;
    fn get_path_mut(&mut self, path: &Path) -> Result<&mut Self>;

    fn remove_comp(&mut self, comp: &Element) -> Result<Option<Self>>;
    fn remove_path(&mut self, path: &Path) -> Result<Option<Self>>;

    fn has_path(&self, path: &Path) -> bool;
}
impl FieldpathExt for Value {
    #[duplicate_item(
        this_method method reference(type) ret_type;
        [get_comp] [get] [&type] [&Self];
        [get_comp_mut] [get_mut] [&mut type] [&mut Self]
    )]
    fn this_method(self: reference([Self]), comp: &Element) -> Result<ret_type> {
        match comp {
            Element::Field(field) => match self {
                Value::Object(obj) => obj.method(field.as_str()).ok_or(Error::FieldNotFound),
                _ => Err(Error::NotAnObject),
            },
            Element::StaticField(field) => match self {
                Value::Object(obj) => obj.method(*field).ok_or(Error::FieldNotFound),
                _ => Err(Error::NotAnObject),
            },
            Element::Index(idx) => match self {
                Value::Array(items) => items.method(*idx).ok_or(Error::OutOfBounds),
                _ => Err(Error::NotAnArray),
            },
        }
    }

    #[duplicate_item(
        this_method method reference(type) ret_type;
        [get_path] [get_comp] [&type] [&Self];
        [get_path_mut] [get_comp_mut] [&mut type] [&mut Self]
    )]
    fn this_method(self: reference([Self]), path: &Path) -> Result<ret_type> {
        let mut found = self;
        for (idx, elem) in path.iter().enumerate() {
            found = found
                .method(elem)
                .map_err(|e| Error::AtPath((&path[0..idx]).into(), Box::new(e)))?;
        }
        Ok(found)
    }

    /// Removing an absent object field is not an error
    fn remove_comp(&mut self, comp: &Element) -> Result<Option<Self>> {
        match (comp.field(), self) {
            (Some(field), Value::Object(obj)) => Ok(obj.remove(field)),
            (Some(_), _) => Err(Error::NotAnObject),
            (None, Value::Array(arr)) => {
                let Element::Index(idx) = comp else {
                    unreachable!("only indexes have no field name")
                };
                if *idx < arr.len() {
                    Ok(Some(arr.remove(*idx)))
                } else {
                    Err(Error::OutOfBounds)
                }
            }
            (None, _) => Err(Error::NotAnArray),
        }
    }
    fn remove_path(&mut self, path: &Path) -> Result<Option<Self>> {
        let (el, path) = path.split_last().ok_or(Error::EmptyPath)?;
        let this = self.get_path_mut(path)?;
        this.remove_comp(el)
            .map_err(|e| Error::AtPath(path.into(), Box::new(e)))
    }

    fn has_path(&self, path: &Path) -> bool {
        self.get_path(path).is_ok()
    }
}
