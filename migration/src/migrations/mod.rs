pub mod m202607010001_create_users;
pub mod m202607010002_create_courses;
pub mod m202607010003_create_course_students;
pub mod m202607010004_create_attendance;
