//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod app_user;
pub mod attendance_record;
pub mod availability_slot;
pub mod class;
pub mod class_student;
pub mod customer;
pub mod enrollment;
pub mod instrument;
pub mod product;
pub mod rental;
pub mod sale;
pub mod sea_orm_active_enums;
pub mod student;
pub mod student_balance;
pub mod student_skill;
pub mod supplier;
pub mod teacher;
pub mod teacher_instrument;
pub mod transaction;
pub mod transaction_line_item;

// Re-export specific types to avoid conflicts
pub use app_user::{Column as AppUserColumn, Entity as AppUser, Model as AppUserModel};
pub use attendance_record::{
    Column as AttendanceRecordColumn, Entity as AttendanceRecord, Model as AttendanceRecordModel,
};
pub use availability_slot::{
    Column as AvailabilitySlotColumn, Entity as AvailabilitySlot, Model as AvailabilitySlotModel,
};
pub use class::{Column as ClassColumn, Entity as Class, Model as ClassModel};
pub use class_student::{
    Column as ClassStudentColumn, Entity as ClassStudent, Model as ClassStudentModel,
};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use enrollment::{Column as EnrollmentColumn, Entity as Enrollment, Model as EnrollmentModel};
pub use instrument::{Column as InstrumentColumn, Entity as Instrument, Model as InstrumentModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use rental::{Column as RentalColumn, Entity as Rental, Model as RentalModel};
pub use sale::{Column as SaleColumn, Entity as Sale, Model as SaleModel};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use student_balance::{
    Column as StudentBalanceColumn, Entity as StudentBalance, Model as StudentBalanceModel,
};
pub use student_skill::{
    Column as StudentSkillColumn, Entity as StudentSkill, Model as StudentSkillModel,
};
pub use supplier::{Column as SupplierColumn, Entity as Supplier, Model as SupplierModel};
pub use teacher::{Column as TeacherColumn, Entity as Teacher, Model as TeacherModel};
pub use teacher_instrument::{
    Column as TeacherInstrumentColumn, Entity as TeacherInstrument,
    Model as TeacherInstrumentModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use transaction_line_item::{
    Column as TransactionLineItemColumn, Entity as TransactionLineItem,
    Model as TransactionLineItemModel,
};
