//! Macros for declaring resource types
//!
//! A declared resource is a plain struct with an optional `id`, an optional
//! `tenant_id`, its scalar fields and one reference list per association,
//! together with the static [`ResourceSchema`](crate::core::resource::ResourceSchema)
//! the engine works from.

/// Declare a resource type and implement [`Resource`](crate::core::resource::Resource) for it
///
/// Scalar field types must implement [`FieldKind`](crate::core::field::FieldKind).
/// Field attributes are passed through, so `validator` rules can be attached
/// directly. Every association is many-to-many; one carrying
/// `=> mapped_by "field"` is the inverse side of the association owned by
/// `field` on the target and is never exposed as a relation.
///
/// The generated struct derives `serde` and `validator` traits, so the calling
/// crate needs both as dependencies.
///
/// # Example
///
/// ```rust,ignore
/// use tenancy::prelude::*;
///
/// impl_resource!(
///     Article,
///     "article",
///     {
///         #[validate(length(min = 1, max = 200))]
///         title: String,
///         views: i64,
///         published_on: Option<NaiveDate>,
///     },
///     relations {
///         tags: Tag,
///         followers: Person => mapped_by "followed",
///     }
/// );
///
/// let article = Article {
///     title: "Hello".to_string(),
///     ..Default::default()
/// };
/// ```
#[macro_export]
macro_rules! impl_resource {
    (
        $(#[$meta:meta])*
        $type:ident,
        $type_name:literal,
        {
            $( $(#[$field_meta:meta])* $field:ident : $field_type:ty ),* $(,)?
        }
        $(,
        relations {
            $( $relation:ident : $target:ty $( => mapped_by $mapped_by:literal )? ),* $(,)?
        }
        )?
        $(,)?
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::validator::Validate,
        )]
        pub struct $type {
            /// Identity, assigned on create
            pub id: Option<::uuid::Uuid>,

            /// Owning tenant, assigned on create
            pub tenant_id: Option<::uuid::Uuid>,

            $( $(#[$field_meta])* pub $field: $field_type, )*

            $($(
                #[serde(default)]
                pub $relation: Vec<$crate::core::resource::Reference>,
            )*)?
        }

        impl $crate::core::resource::Resource for $type {
            const NAME: &'static str = $type_name;

            fn schema() -> &'static $crate::core::resource::ResourceSchema {
                const FIELDS: &[$crate::core::resource::FieldDef] = &[
                    $crate::core::resource::FieldDef::new("id", $crate::core::field::FieldType::Uuid),
                    $crate::core::resource::FieldDef::new(
                        "tenant_id",
                        $crate::core::field::FieldType::Uuid,
                    ),
                    $(
                        $crate::core::resource::FieldDef::new(
                            stringify!($field),
                            <$field_type as $crate::core::field::FieldKind>::FIELD_TYPE,
                        ),
                    )*
                ];
                const RELATIONS: &[$crate::core::resource::RelationField] = &[
                    $($(
                        $crate::core::resource::RelationField {
                            name: stringify!($relation),
                            kind: $crate::core::resource::RelationKind::ManyToMany,
                            target: <$target as $crate::core::resource::Resource>::NAME,
                            mapped_by: $crate::__mapped_by!($($mapped_by)?),
                        },
                    )*)?
                ];
                static SCHEMA: $crate::core::resource::ResourceSchema =
                    $crate::core::resource::ResourceSchema {
                        name: $type_name,
                        id_field: "id",
                        tenant_field: "tenant_id",
                        fields: FIELDS,
                        relations: RELATIONS,
                    };
                &SCHEMA
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __mapped_by {
    () => {
        None
    };
    ($owner:literal) => {
        Some($owner)
    };
}
