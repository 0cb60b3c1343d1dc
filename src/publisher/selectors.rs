//! Element selectors of the classic post editor and the login form.

// login form
pub const USER_LOGIN: &str = "user_login";
pub const USER_PASS: &str = "user_pass";
pub const LOGIN_SUBMIT: &str = "wp-submit";
pub const ADMIN_BAR: &str = "wpadminbar";

// editor
pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const TEXT_MODE: &str = "content-html";
pub const VISUAL_MODE: &str = "content-tmce";

// featured image
pub const SET_THUMBNAIL: &str = "set-post-thumbnail";
pub const MEDIA_MODAL: &str = "media-modal";
pub const MEDIA_LIBRARY_TAB: &str = ".media-menu-item:nth-child(2)";
pub const ATTACHMENT: &str = ".attachment-preview";
pub const MEDIA_SELECT: &str = ".media-button-select";
pub const MEDIA_CLOSE: &str = ".media-modal-close";

// categories
pub const CATEGORY_DIV: &str = "categorydiv";
pub const PANEL_TOGGLE: &str = "handlediv";
pub const CATEGORY_CHECKLIST: &str = "categorychecklist";

// tags
pub const TAG_INPUT: &str = "new-tag-post_tag";
pub const TAG_CHIP: &str = ".tagchecklist > span";
pub const TAG_ADD: &str = "input.tagadd";

// publish box
pub const SUBMIT_DIV: &str = "submitdiv";
pub const STATUS_DISPLAY: &str = "post-status-display";
pub const EDIT_STATUS: &str = "a.edit-post-status";
pub const STATUS_SELECT: &str = "post_status";
pub const SAVE_STATUS: &str = "a.save-post-status";
pub const PUBLISH: &str = "publish";
pub const SAVE_DRAFT: &str = "save-post";
pub const UPDATED_MESSAGE: &str = "#message.updated";
