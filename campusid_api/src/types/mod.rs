mod de;

mod pagination;
pub use self::pagination::{PageLink, Paginated};

mod student;
pub use self::student::{IdType, Student, StudentId};

mod registration;
pub use self::registration::{MediaPayload, NamedImage, StudentDetails};

mod validation;
pub use self::validation::ValidationErrors;

mod location;
pub use self::location::{
    BarangayRow, LocationTree, Municipality, MunicipalityRow, Province, ProvinceRow, Region,
};
