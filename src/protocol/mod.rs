/*!
 * Storage protocols for s3bridge
 *
 * Only S3 (AWS and S3-compatible services) is supported. The transfer
 * orchestrator talks to it through the [`s3::S3Operations`] trait.
 */

pub mod s3;
