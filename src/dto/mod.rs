pub mod auth_dto;
pub mod exam_dto;
