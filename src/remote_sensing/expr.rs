//! Earth Engine expression graphs
//!
//! The REST API evaluates a graph of named values where every function
//! invocation refers to its inputs by key. [`ExprGraph`] allocates those keys
//! and offers typed helpers for the algorithms this crate needs.

use super::DateWindow;
use serde_json::{Map, Value, json};

/// Key of a value stored in an [`ExprGraph`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef(String);

impl NodeRef {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.0
    }
}

/// Function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Node(NodeRef),
    Constant(Value),
    /// Parameter of the enclosing function definition
    Argument(String),
    /// Function definition with the given parameters
    Function { params: Vec<String>, body: NodeRef },
}

impl Arg {
    pub fn constant(value: impl Into<Value>) -> Self {
        Arg::Constant(value.into())
    }

    fn encode(&self) -> Value {
        match self {
            Arg::Node(node) => json!({ "valueReference": node.0 }),
            Arg::Constant(value) => json!({ "constantValue": value }),
            Arg::Argument(name) => json!({ "argumentReference": name }),
            Arg::Function { params, body } => json!({
                "functionDefinitionValue": { "argumentNames": params, "body": body.0 }
            }),
        }
    }
}

impl From<NodeRef> for Arg {
    fn from(node: NodeRef) -> Self {
        Arg::Node(node)
    }
}

impl From<&NodeRef> for Arg {
    fn from(node: &NodeRef) -> Self {
        Arg::Node(node.clone())
    }
}

/// Parameter name used for per-image functions passed to `Collection.map`
const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

#[derive(Debug, Default)]
pub struct ExprGraph {
    values: Map<String, Value>,
}

impl ExprGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function invocation and return its key
    pub fn call<'a>(
        &mut self,
        function: &str,
        args: impl IntoIterator<Item = (&'a str, Arg)>,
    ) -> NodeRef {
        let arguments: Map<String, Value> = args
            .into_iter()
            .map(|(name, arg)| (name.to_string(), arg.encode()))
            .collect();
        let key = self.values.len().to_string();
        self.values.insert(
            key.clone(),
            json!({
                "functionInvocationValue": { "functionName": function, "arguments": arguments }
            }),
        );
        NodeRef(key)
    }

    /// Finish the graph with `result` as the evaluated value
    #[must_use]
    pub fn into_expression(self, result: &NodeRef) -> Value {
        json!({ "result": result.0, "values": self.values })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // geometry

    /// Planar polygon from a closed (lon, lat) ring
    pub fn polygon(&mut self, ring: &[[f64; 2]]) -> NodeRef {
        self.call(
            "GeometryConstructors.Polygon",
            [
                ("coordinates", Arg::constant(json!([ring]))),
                ("geodesic", Arg::constant(false)),
            ],
        )
    }

    // collections

    pub fn load_collection(&mut self, id: &str) -> NodeRef {
        self.call("ImageCollection.load", [("id", Arg::constant(id))])
    }

    pub fn filter_date(&mut self, collection: &NodeRef, window: &DateWindow) -> NodeRef {
        let start = self.call(
            "Date",
            [("value", Arg::constant(window.start.format("%Y-%m-%d").to_string()))],
        );
        let end = self.call(
            "Date",
            [("value", Arg::constant(window.end.format("%Y-%m-%d").to_string()))],
        );
        let range = self.call("DateRange", [("start", start.into()), ("end", end.into())]);
        let filter = self.call(
            "Filter.dateRangeContains",
            [
                ("leftValue", range.into()),
                ("rightField", Arg::constant("system:time_start")),
            ],
        );
        self.call(
            "Collection.filter",
            [("collection", collection.into()), ("filter", filter.into())],
        )
    }

    pub fn filter_bounds(&mut self, collection: &NodeRef, geometry: &NodeRef) -> NodeRef {
        let filter = self.call(
            "Filter.intersects",
            [
                ("leftField", Arg::constant(".all")),
                ("rightValue", geometry.into()),
            ],
        );
        self.call(
            "Collection.filter",
            [("collection", collection.into()), ("filter", filter.into())],
        )
    }

    /// Apply a per-image function built by `body` to every image of a collection
    pub fn map_images(
        &mut self,
        collection: &NodeRef,
        body: impl FnOnce(&mut ExprGraph, Arg) -> NodeRef,
    ) -> NodeRef {
        let body = body(self, Arg::Argument(MAPPING_VAR.to_string()));
        self.call(
            "Collection.map",
            [
                ("collection", collection.into()),
                (
                    "baseAlgorithm",
                    Arg::Function {
                        params: vec![MAPPING_VAR.to_string()],
                        body,
                    },
                ),
            ],
        )
    }

    pub fn select_collection(&mut self, collection: &NodeRef, bands: &[&str]) -> NodeRef {
        self.map_images(collection, |g, image| g.select(image, bands))
    }

    pub fn flatten(&mut self, collection: &NodeRef) -> NodeRef {
        self.call("Collection.flatten", [("collection", collection.into())])
    }

    pub fn size(&mut self, collection: &NodeRef) -> NodeRef {
        self.call("Collection.size", [("collection", collection.into())])
    }

    pub fn mosaic(&mut self, collection: &NodeRef) -> NodeRef {
        self.call("ImageCollection.mosaic", [("collection", collection.into())])
    }

    pub fn median(&mut self, collection: &NodeRef) -> NodeRef {
        self.call("reduce.median", [("collection", collection.into())])
    }

    pub fn mean(&mut self, collection: &NodeRef) -> NodeRef {
        self.call("reduce.mean", [("collection", collection.into())])
    }

    // images

    pub fn load_image(&mut self, id: &str) -> NodeRef {
        self.call("Image.load", [("id", Arg::constant(id))])
    }

    pub fn constant_image(&mut self, value: f64) -> NodeRef {
        self.call("Image.constant", [("value", Arg::constant(value))])
    }

    pub fn select(&mut self, image: impl Into<Arg>, bands: &[&str]) -> NodeRef {
        self.call(
            "Image.select",
            [
                ("input", image.into()),
                ("bandSelectors", Arg::constant(json!(bands))),
            ],
        )
    }

    pub fn rename(&mut self, image: &NodeRef, names: &[&str]) -> NodeRef {
        self.call(
            "Image.rename",
            [
                ("input", image.into()),
                ("names", Arg::constant(json!(names))),
            ],
        )
    }

    pub fn clip(&mut self, image: &NodeRef, geometry: &NodeRef) -> NodeRef {
        self.call(
            "Image.clip",
            [("input", image.into()), ("geometry", geometry.into())],
        )
    }

    /// Per-pixel `image > value`
    pub fn gt(&mut self, image: &NodeRef, value: f64) -> NodeRef {
        let threshold = self.constant_image(value);
        self.call(
            "Image.gt",
            [("image1", image.into()), ("image2", threshold.into())],
        )
    }

    /// Per-pixel `image < value`
    pub fn lt(&mut self, image: &NodeRef, value: f64) -> NodeRef {
        let threshold = self.constant_image(value);
        self.call(
            "Image.lt",
            [("image1", image.into()), ("image2", threshold.into())],
        )
    }

    pub fn and(&mut self, a: &NodeRef, b: &NodeRef) -> NodeRef {
        self.call("Image.and", [("image1", a.into()), ("image2", b.into())])
    }

    /// Mask every pixel whose value is zero
    pub fn self_mask(&mut self, image: &NodeRef) -> NodeRef {
        self.call("Image.selfMask", [("image", image.into())])
    }

    pub fn add_bands(&mut self, image: &NodeRef, other: &NodeRef) -> NodeRef {
        self.call(
            "Image.addBands",
            [("dstImg", image.into()), ("srcImg", other.into())],
        )
    }

    pub fn reducer_mean(&mut self) -> NodeRef {
        self.call("Reducer.mean", std::iter::empty())
    }

    /// Best-effort mean of every band over a geometry
    pub fn reduce_region_mean(
        &mut self,
        image: &NodeRef,
        geometry: &NodeRef,
        scale: f64,
        max_pixels: f64,
    ) -> NodeRef {
        let reducer = self.reducer_mean();
        self.call(
            "Image.reduceRegion",
            [
                ("image", image.into()),
                ("reducer", reducer.into()),
                ("geometry", geometry.into()),
                ("scale", Arg::constant(scale)),
                ("bestEffort", Arg::constant(true)),
                ("maxPixels", Arg::constant(max_pixels)),
            ],
        )
    }

    /// Centroids of connected label regions, carrying the mean of the remaining bands
    pub fn centroids(
        &mut self,
        image: &NodeRef,
        geometry: &NodeRef,
        scale: f64,
        label_property: &str,
    ) -> NodeRef {
        let reducer = self.reducer_mean();
        self.call(
            "Image.reduceToVectors",
            [
                ("image", image.into()),
                ("reducer", reducer.into()),
                ("geometry", geometry.into()),
                ("scale", Arg::constant(scale)),
                ("geometryType", Arg::constant("centroid")),
                ("labelProperty", Arg::constant(label_property)),
                ("maxPixels", Arg::constant(super::MAX_PIXELS)),
            ],
        )
    }

    pub fn visualize(&mut self, image: &NodeRef, min: f64, max: f64, palette: &[&str]) -> NodeRef {
        self.call(
            "Image.visualize",
            [
                ("image", image.into()),
                ("min", Arg::constant(min)),
                ("max", Arg::constant(max)),
                ("palette", Arg::constant(json!(palette))),
            ],
        )
    }
}
