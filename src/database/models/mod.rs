pub mod product;

pub use product::{
    CategoryRef, FieldErrors, NewProduct, ProductChanges, ProductDetail, ProductDetailRow, ProductId,
    ProductItem, ProductItemRow, ProductList, ProductOwnership,
};
