pub mod registry;

pub use registry::{Catalog, CatalogError, DataPackage, InMemoryCatalog, ItemDefinition, PackageBuilder};
