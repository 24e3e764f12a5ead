use crate::error::TransformError;
use crate::keypoints::{Frame, KeyPoints};
use anyhow::{bail, ensure, Result};
use image::{DynamicImage, GenericImageView, GrayImage};
use std::collections::BTreeMap;
use std::fmt;

/// The closed alphabet of item kinds a [`DataContainer`] can hold.
///
/// | Code | Kind        | Payload                            |
/// |------|-------------|------------------------------------|
/// | `I`  | `Image`     | `DynamicImage`                     |
/// | `M`  | `Mask`      | `GrayImage` sharing image geometry |
/// | `P`  | `KeyPoints` | `KeyPoints` (points + frame)       |
/// | `L`  | `Label`     | `Label`, never transformed         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemType {
    Image,
    Mask,
    KeyPoints,
    Label,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [Self::Image, Self::Mask, Self::KeyPoints, Self::Label];

    pub const fn code(self) -> char {
        match self {
            Self::Image => 'I',
            Self::Mask => 'M',
            Self::KeyPoints => 'P',
            Self::Label => 'L',
        }
    }

    pub fn from_code(code: char) -> Result<Self> {
        Ok(match code {
            'I' => Self::Image,
            'M' => Self::Mask,
            'P' => Self::KeyPoints,
            'L' => Self::Label,
            other => bail!(TransformError::UnknownTypeCode(other)),
        })
    }

    /// Field name used by dictionary input and dictionary export.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Mask => "mask",
            Self::KeyPoints => "keypoints",
            Self::Label => "label",
        }
    }

    fn from_field_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.field_name() == name)
            .ok_or_else(|| TransformError::UnknownField(name.to_string()).into())
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// An opaque per-sample label. Labels travel through every transform untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    Int(i64),
    Float(f64),
    Text(String),
}

/// One item of a sample, tagged by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Image(DynamicImage),
    Mask(GrayImage),
    KeyPoints(KeyPoints),
    Label(Label),
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Image(_) => ItemType::Image,
            Self::Mask(_) => ItemType::Mask,
            Self::KeyPoints(_) => ItemType::KeyPoints,
            Self::Label(_) => ItemType::Label,
        }
    }

    /// Spatial frame of the item; labels have none.
    pub fn frame(&self) -> Option<Frame> {
        match self {
            Self::Image(img) => {
                let (width, height) = img.dimensions();
                Some(Frame::new(height, width))
            }
            Self::Mask(mask) => Some(Frame::new(mask.height(), mask.width())),
            Self::KeyPoints(kpts) => Some(kpts.frame()),
            Self::Label(_) => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "an image",
            Self::Mask(_) => "a mask",
            Self::KeyPoints(_) => "keypoints",
            Self::Label(_) => "a label",
        }
    }
}

impl From<DynamicImage> for Item {
    fn from(img: DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl From<GrayImage> for Item {
    fn from(mask: GrayImage) -> Self {
        Self::Mask(mask)
    }
}

impl From<KeyPoints> for Item {
    fn from(kpts: KeyPoints) -> Self {
        Self::KeyPoints(kpts)
    }
}

impl From<Label> for Item {
    fn from(label: Label) -> Self {
        Self::Label(label)
    }
}

impl From<i64> for Item {
    fn from(value: i64) -> Self {
        Self::Label(Label::Int(value))
    }
}

/// An ordered, fixed-arity bundle of the items derived from one sample.
///
/// The type codes are kept as one string parallel to the items, so
/// `codes().len() == len()` always holds. A container is a value:
/// transforms read it and hand back a new one.
///
/// # Example
/// ```ignore
/// let dc = DataContainer::new(vec![img.into(), mask.into(), 3_i64.into()], "IML")?;
/// assert_eq!(dc.item_type(1), Some(ItemType::Mask));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer {
    items: Vec<Item>,
    codes: String,
}

impl DataContainer {
    /// Creates a container from items and their type-code string.
    ///
    /// Fails if the lengths differ, a code is outside the alphabet, or an
    /// item does not carry the variant its code announces.
    pub fn new(items: Vec<Item>, codes: &str) -> Result<Self> {
        let types = codes
            .chars()
            .map(ItemType::from_code)
            .collect::<Result<Vec<_>>>()?;
        ensure!(
            types.len() == items.len(),
            TransformError::LengthMismatch {
                items: items.len(),
                codes: types.len(),
            }
        );
        for (position, (item, declared)) in items.iter().zip(&types).enumerate() {
            ensure!(
                item.item_type() == *declared,
                TransformError::CodeMismatch {
                    position,
                    code: declared.code(),
                    actual: item.kind_name(),
                }
            );
        }
        Ok(Self {
            items,
            codes: codes.to_string(),
        })
    }

    /// Creates a container whose codes are derived from the item variants.
    pub fn from_items(items: Vec<Item>) -> Self {
        let codes = items.iter().map(|i| i.item_type().code()).collect();
        Self { items, codes }
    }

    /// Single-image container (`"I"`).
    pub fn from_image(img: DynamicImage) -> Self {
        Self {
            items: vec![Item::Image(img)],
            codes: "I".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn codes(&self) -> &str {
        &self.codes
    }

    /// Returns the item at `index` together with its type.
    pub fn get(&self, index: usize) -> Option<(&Item, ItemType)> {
        self.items.get(index).map(|item| (item, item.item_type()))
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn item_type(&self, index: usize) -> Option<ItemType> {
        self.items.get(index).map(Item::item_type)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Item, ItemType)> {
        self.items.iter().map(|item| (item, item.item_type()))
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Returns a copy with the item at `index` replaced. The replacement
    /// must keep the type code of that position.
    pub fn replace(&self, index: usize, item: Item) -> Result<Self> {
        let current = self.item_type(index).ok_or(TransformError::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        ensure!(
            item.item_type() == current,
            TransformError::CodeMismatch {
                position: index,
                code: current.code(),
                actual: item.kind_name(),
            }
        );
        let mut items = self.items.clone();
        items[index] = item;
        Ok(Self {
            items,
            codes: self.codes.clone(),
        })
    }

    /// Rebuilds a container from transformed items, keeping the codes.
    /// Callers guarantee the items keep their variants position by position.
    pub(crate) fn with_items(&self, items: Vec<Item>) -> Self {
        debug_assert_eq!(items.len(), self.items.len());
        Self {
            items,
            codes: self.codes.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a DataContainer {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Loosely-typed input accepted by [`wrap`].
///
/// Only images, `(items, codes)` tuples, field dictionaries and existing
/// containers can be wrapped; the remaining variants exist so the
/// rejection of bare lists, strings and numbers is explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Image(DynamicImage),
    Items(Vec<Item>, String),
    Dict(BTreeMap<String, Item>),
    Container(DataContainer),
    List(Vec<RawData>),
    Text(String),
    Float(f64),
    Int(i64),
}

impl RawData {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "an image",
            Self::Items(..) => "an item tuple",
            Self::Dict(_) => "a dict",
            Self::Container(_) => "a container",
            Self::List(_) => "a list",
            Self::Text(_) => "a string",
            Self::Float(_) => "a float",
            Self::Int(_) => "an integer",
        }
    }
}

impl From<DynamicImage> for RawData {
    fn from(img: DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl From<DataContainer> for RawData {
    fn from(dc: DataContainer) -> Self {
        Self::Container(dc)
    }
}

impl From<&DataContainer> for RawData {
    fn from(dc: &DataContainer) -> Self {
        Self::Container(dc.clone())
    }
}

impl<S: Into<String>> From<(Vec<Item>, S)> for RawData {
    fn from((items, codes): (Vec<Item>, S)) -> Self {
        Self::Items(items, codes.into())
    }
}

impl From<BTreeMap<String, Item>> for RawData {
    fn from(fields: BTreeMap<String, Item>) -> Self {
        Self::Dict(fields)
    }
}

impl From<Vec<RawData>> for RawData {
    fn from(list: Vec<RawData>) -> Self {
        Self::List(list)
    }
}

impl From<&str> for RawData {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawData {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for RawData {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for RawData {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Wraps raw input into a [`DataContainer`].
///
/// - an image becomes a single `I` item;
/// - `(items, codes)` is validated by [`DataContainer::new`];
/// - a dict is read in field order `image`, `mask`, `keypoints`, `label`;
/// - a container is passed through.
///
/// Anything else is a type error.
pub fn wrap(data: impl Into<RawData>) -> Result<DataContainer> {
    match data.into() {
        RawData::Image(img) => Ok(DataContainer::from_image(img)),
        RawData::Items(items, codes) => DataContainer::new(items, &codes),
        RawData::Container(dc) => Ok(dc),
        RawData::Dict(fields) => from_fields(fields),
        other => bail!(TransformError::UnsupportedInput(other.kind_name())),
    }
}

fn from_fields(fields: BTreeMap<String, Item>) -> Result<DataContainer> {
    let mut typed = fields
        .into_iter()
        .map(|(name, item)| {
            let field = ItemType::from_field_name(&name)?;
            ensure!(
                item.item_type() == field,
                TransformError::FieldMismatch {
                    field: field.field_name(),
                    actual: item.kind_name(),
                }
            );
            Ok((field, item))
        })
        .collect::<Result<Vec<_>>>()?;
    typed.sort_by_key(|(field, _)| *field);
    Ok(DataContainer::from_items(
        typed.into_iter().map(|(_, item)| item).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_kind, ErrorKind};
    use image::{Luma, RgbImage};

    fn red_image(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, image::Rgb([value, 0, 0])))
    }

    #[test]
    fn test_new_validates_codes() -> Result<()> {
        let dc = DataContainer::new(vec![red_image(1).into(), Item::from(4_i64)], "IL")?;
        assert_eq!(dc.len(), 2);
        assert_eq!(dc.codes(), "IL");
        assert_eq!(dc.get(1).map(|(_, t)| t), Some(ItemType::Label));

        let err = DataContainer::new(vec![red_image(1).into()], "IL").unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Value));

        let err = DataContainer::new(vec![red_image(1).into()], "X").unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Type));

        let err = DataContainer::new(vec![red_image(1).into()], "M").unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Type));
        Ok(())
    }

    #[test]
    fn test_equality_is_structural() -> Result<()> {
        let a = DataContainer::new(vec![red_image(7).into(), Item::from(1_i64)], "IL")?;
        let b = DataContainer::new(vec![red_image(7).into(), Item::from(1_i64)], "IL")?;
        assert_eq!(a, b);

        let c = b.replace(0, red_image(8).into())?;
        assert_ne!(a, c);

        let d = b.replace(1, Item::from(2_i64))?;
        assert_ne!(a, d);
        Ok(())
    }

    #[test]
    fn test_replace_keeps_type_code() {
        let dc = DataContainer::from_image(red_image(1));
        let err = dc.replace(0, Item::from(1_i64)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Type));
        assert!(dc.replace(5, red_image(2).into()).is_err());
    }

    #[test]
    fn test_wrap_dict_orders_fields() -> Result<()> {
        let mask = GrayImage::from_pixel(2, 2, Luma([1]));
        let fields = BTreeMap::from([
            ("label".to_string(), Item::from(3_i64)),
            ("mask".to_string(), Item::Mask(mask)),
            ("image".to_string(), red_image(5).into()),
        ]);
        let dc = wrap(fields)?;
        assert_eq!(dc.codes(), "IML");
        Ok(())
    }

    #[test]
    fn test_wrap_dict_rejects_unknown_field() {
        let fields = BTreeMap::from([("pixels".to_string(), Item::Image(red_image(5)))]);
        let err = wrap(fields).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Value));

        let fields = BTreeMap::from([
            ("image".to_string(), Item::Image(red_image(5))),
            ("mask".to_string(), Item::Image(red_image(5))),
        ]);
        let err = wrap(fields).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Type));
        assert!(err.to_string().contains("field `mask` holds an image"), "{err}");
    }

    #[test]
    fn test_item_frames() -> Result<()> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 3));
        assert_eq!(Item::Image(img).frame(), Some(Frame::new(3, 4)));
        let kpts = KeyPoints::new(vec![], Frame::new(5, 6))?;
        assert_eq!(Item::KeyPoints(kpts).frame(), Some(Frame::new(5, 6)));
        assert_eq!(Item::from(1_i64).frame(), None);
        Ok(())
    }
}
